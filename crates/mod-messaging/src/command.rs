use std::fmt;
use std::str::FromStr;

pub const CMD_GENERATE: &str = "获取邮箱";
pub const CMD_LIST: &str = "邮箱列表";
pub const CMD_VIEW: &str = "查看正文";
pub const CMD_HELP: &str = "邮箱帮助";
pub const CMD_STATUS: &str = "邮箱状态";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate,
    List { mailbox_id: Option<String> },
    View { message_id: Option<String> },
    Status,
    Help,
}

impl Command {
    /// `None` for text that is not one of the plugin's commands.
    pub fn parse(text: &str) -> Option<Self> {
        text.parse().ok()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate => write!(f, "{CMD_GENERATE}"),
            Self::List { mailbox_id: None } => write!(f, "{CMD_LIST}"),
            Self::List { mailbox_id: Some(id) } => write!(f, "{CMD_LIST} {id}"),
            Self::View { message_id: None } => write!(f, "{CMD_VIEW}"),
            Self::View { message_id: Some(id) } => write!(f, "{CMD_VIEW} {id}"),
            Self::Status => write!(f, "{CMD_STATUS}"),
            Self::Help => write!(f, "{CMD_HELP}"),
        }
    }
}

impl FromStr for Command {
    type Err = String;

    /// First token picks the command, the second (if any) is its id argument.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let name = parts.next().unwrap_or("");
        let arg = parts.next().map(str::to_string);
        match name.strip_prefix('/').unwrap_or(name) {
            CMD_GENERATE => Ok(Self::Generate),
            CMD_LIST => Ok(Self::List { mailbox_id: arg }),
            CMD_VIEW => Ok(Self::View { message_id: arg }),
            CMD_STATUS => Ok(Self::Status),
            CMD_HELP => Ok(Self::Help),
            _ => Err(format!("unknown command: {name}")),
        }
    }
}

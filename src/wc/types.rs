//! Shared enums used across the BASE/WORKING/ACTUAL rows.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
    Symlink,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Directory => "directory",
            NodeKind::Symlink => "symlink",
        }
    }
}

impl FromStr for NodeKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(NodeKind::File),
            "directory" => Ok(NodeKind::Directory),
            "symlink" => Ok(NodeKind::Symlink),
            other => Err(format!("unknown node kind: {other}")),
        }
    }
}

/// BASE row status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseStatus {
    Normal,
    NotPresent,
    Absent,
    Excluded,
    Incomplete,
    BaseDeleted,
}

impl BaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BaseStatus::Normal => "normal",
            BaseStatus::NotPresent => "not-present",
            BaseStatus::Absent => "absent",
            BaseStatus::Excluded => "excluded",
            BaseStatus::Incomplete => "incomplete",
            BaseStatus::BaseDeleted => "base-deleted",
        }
    }
}

impl FromStr for BaseStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(BaseStatus::Normal),
            "not-present" => Ok(BaseStatus::NotPresent),
            "absent" => Ok(BaseStatus::Absent),
            "excluded" => Ok(BaseStatus::Excluded),
            "incomplete" => Ok(BaseStatus::Incomplete),
            "base-deleted" => Ok(BaseStatus::BaseDeleted),
            other => Err(format!("unknown base status: {other}")),
        }
    }
}

/// WORKING row presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingPresence {
    Normal,
    NotPresent,
    BaseDeleted,
    Incomplete,
    Excluded,
}

impl WorkingPresence {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkingPresence::Normal => "normal",
            WorkingPresence::NotPresent => "not-present",
            WorkingPresence::BaseDeleted => "base-deleted",
            WorkingPresence::Incomplete => "incomplete",
            WorkingPresence::Excluded => "excluded",
        }
    }
}

impl FromStr for WorkingPresence {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(WorkingPresence::Normal),
            "not-present" => Ok(WorkingPresence::NotPresent),
            "base-deleted" => Ok(WorkingPresence::BaseDeleted),
            "incomplete" => Ok(WorkingPresence::Incomplete),
            "excluded" => Ok(WorkingPresence::Excluded),
            other => Err(format!("unknown working presence: {other}")),
        }
    }
}

/// Recursion depth recorded on a directory BASE row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Empty,
    Files,
    Immediates,
    Infinity,
}

impl Depth {
    pub fn as_str(self) -> &'static str {
        match self {
            Depth::Empty => "empty",
            Depth::Files => "files",
            Depth::Immediates => "immediates",
            Depth::Infinity => "infinity",
        }
    }
}

impl FromStr for Depth {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "empty" => Ok(Depth::Empty),
            "files" => Ok(Depth::Files),
            "immediates" => Ok(Depth::Immediates),
            "infinity" => Ok(Depth::Infinity),
            other => Err(format!("unknown depth: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_round_trips_through_as_str() {
        assert_eq!("directory".parse::<NodeKind>().unwrap().as_str(), "directory");
        assert!("bogus".parse::<NodeKind>().is_err());
    }

    #[test]
    fn base_status_round_trips_through_as_str() {
        assert_eq!("base-deleted".parse::<BaseStatus>().unwrap().as_str(), "base-deleted");
        assert!("bogus".parse::<BaseStatus>().is_err());
    }

    #[test]
    fn working_presence_round_trips_through_as_str() {
        assert_eq!("not-present".parse::<WorkingPresence>().unwrap().as_str(), "not-present");
        assert!("bogus".parse::<WorkingPresence>().is_err());
    }

    #[test]
    fn depth_round_trips_through_as_str_and_clap_parses_it() {
        assert_eq!("infinity".parse::<Depth>().unwrap().as_str(), "infinity");
        assert!("bogus".parse::<Depth>().is_err());
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Error raised when a kind, operation or enum label cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    #[error("unknown ticket status: {0}")]
    UnknownStatus(String),
    #[error("unknown ticket priority: {0}")]
    UnknownPriority(String),
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct UserId(pub String);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProjectId(pub u64);

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TicketId(pub u64);

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CommentId(pub u64);

/// The closed set of resource kinds that carry authorization policy.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Project,
    Ticket,
    Comment,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Project,
        ResourceKind::Ticket,
        ResourceKind::Comment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Project => "Project",
            ResourceKind::Ticket => "Ticket",
            ResourceKind::Comment => "Comment",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "project" => Ok(ResourceKind::Project),
            "ticket" => Ok(ResourceKind::Ticket),
            "comment" => Ok(ResourceKind::Comment),
            other => Err(ParseError::UnknownKind(other.to_string())),
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "Create",
            Operation::Read => "Read",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Operation::Create),
            "read" => Ok(Operation::Read),
            "update" | "edit" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other => Err(ParseError::UnknownOperation(other.to_string())),
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Status {
    #[default]
    Bug,
    Feature,
}

impl FromStr for Status {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bug" => Ok(Status::Bug),
            "feature" => Ok(Status::Feature),
            other => Err(ParseError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Priority::None),
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ParseError::UnknownPriority(other.to_string())),
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub owner_id: UserId,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub short_description: String,
    pub long_description: String,
    pub status: Status,
    pub priority: Priority,
    pub date: DateTime<Utc>,
    pub project_id: ProjectId,
    /// Absent on rows created before ownership was tracked.
    pub owner_id: Option<UserId>,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub date: DateTime<Utc>,
    pub ticket_id: TicketId,
    pub owner_id: UserId,
}

/// Borrowed view over any resource instance that authorization can inspect.
#[derive(Clone, Copy, Debug)]
pub enum ResourceRef<'a> {
    Project(&'a Project),
    Ticket(&'a Ticket),
    Comment(&'a Comment),
}

impl<'a> ResourceRef<'a> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRef::Project(_) => ResourceKind::Project,
            ResourceRef::Ticket(_) => ResourceKind::Ticket,
            ResourceRef::Comment(_) => ResourceKind::Comment,
        }
    }

    pub fn owner_id(&self) -> Option<&'a UserId> {
        match *self {
            ResourceRef::Project(project) => Some(&project.owner_id),
            ResourceRef::Ticket(ticket) => ticket.owner_id.as_ref(),
            ResourceRef::Comment(comment) => Some(&comment.owner_id),
        }
    }
}

/// Implemented by every entity that can be the target of an authorization check.
pub trait AsResource {
    fn as_resource(&self) -> ResourceRef<'_>;
}

impl AsResource for Project {
    fn as_resource(&self) -> ResourceRef<'_> {
        ResourceRef::Project(self)
    }
}

impl AsResource for Ticket {
    fn as_resource(&self) -> ResourceRef<'_> {
        ResourceRef::Ticket(self)
    }
}

impl AsResource for Comment {
    fn as_resource(&self) -> ResourceRef<'_> {
        ResourceRef::Comment(self)
    }
}

impl<'a> AsResource for ResourceRef<'a> {
    fn as_resource(&self) -> ResourceRef<'_> {
        *self
    }
}

pub fn kind_of<R: AsResource + ?Sized>(resource: &R) -> ResourceKind {
    resource.as_resource().kind()
}

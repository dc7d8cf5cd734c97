use crate::prelude::*;

/// Human readable name shown in the editor scene list
#[derive(Component, Clone, Debug, PartialEq)]
pub struct Tag {
    pub label: String,
}

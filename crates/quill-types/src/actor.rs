//! Request actors and marketplace roles.
//!
//! The authentication shell resolves the caller once per request and hands
//! the resulting [`Actor`] to every lifecycle operation. Nothing downstream
//! reads identity from ambient request context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::UserId;

/// A role a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	Customer,
	Writer,
	Admin,
	SuperAdmin,
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Customer => "customer",
			Role::Writer => "writer",
			Role::Admin => "admin",
			Role::SuperAdmin => "super_admin",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"customer" | "user" => Ok(Role::Customer),
			"writer" => Ok(Role::Writer),
			"admin" => Ok(Role::Admin),
			"super_admin" => Ok(Role::SuperAdmin),
			other => Err(format!("Unknown role: {}", other)),
		}
	}
}

/// The caller of a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
	pub id: UserId,
	pub roles: BTreeSet<Role>,
}

impl Actor {
	pub fn new(id: impl Into<UserId>, roles: impl IntoIterator<Item = Role>) -> Self {
		Self {
			id: id.into(),
			roles: roles.into_iter().collect(),
		}
	}

	pub fn has_role(&self, role: Role) -> bool {
		self.roles.contains(&role)
	}

	/// Admins and super admins are staff.
	pub fn is_staff(&self) -> bool {
		self.has_role(Role::Admin) || self.has_role(Role::SuperAdmin)
	}

	pub fn is_writer(&self) -> bool {
		self.has_role(Role::Writer)
	}
}

impl fmt::Display for Actor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.id)
	}
}

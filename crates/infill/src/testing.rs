//! Model types shared by unit tests: users carry a role, roles carry an
//! authority level looked up from a fixed table.

use crate::{Enrich, FillHandler, FillMetadata, FillTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
	pub level: u32,
}

impl FillTarget for Authority {}

/// Maps user ids `"1"`..`"4"` to authority levels `101`..`104`.
pub struct AuthorityHandler;

impl AuthorityHandler {
	fn lookup(user_id: &str) -> Option<Authority> {
		match user_id {
			"1" => Some(Authority { level: 101 }),
			"2" => Some(Authority { level: 102 }),
			"3" => Some(Authority { level: 103 }),
			"4" => Some(Authority { level: 104 }),
			_ => None,
		}
	}
}

impl FillHandler for AuthorityHandler {
	fn construct() -> anyhow::Result<Self> {
		Ok(Self)
	}

	fn fill(&self, metadata: &mut FillMetadata<'_>) -> anyhow::Result<()> {
		let found = metadata.selection_key().and_then(|key| key.as_str()).and_then(Self::lookup);
		if let Some(authority) = found {
			metadata.set(authority)?;
		}
		Ok(())
	}
}

/// Enrichable role whose authority is keyed by the inherited `userId`.
#[derive(Debug, Enrich)]
#[enrich(enrichable)]
pub struct Role {
	pub role_name: String,
	#[fill(key = "userId", handler = AuthorityHandler)]
	pub authority: Option<Authority>,
}

impl Role {
	pub fn named(role_name: &str) -> Self {
		Self {
			role_name: role_name.to_string(),
			authority: None,
		}
	}
}

/// Builds an unfilled [`Role`] named after the user id.
pub struct RoleHandler;

impl FillHandler for RoleHandler {
	fn construct() -> anyhow::Result<Self> {
		Ok(Self)
	}

	fn fill(&self, metadata: &mut FillMetadata<'_>) -> anyhow::Result<()> {
		if let Some(key) = metadata.selection_key() {
			let role = Role::named(&format!("role-{key}"));
			metadata.set(role)?;
		}
		Ok(())
	}
}

/// Writes the selection key it saw, or `"<none>"`.
pub struct EchoHandler;

impl FillHandler for EchoHandler {
	fn construct() -> anyhow::Result<Self> {
		Ok(Self)
	}

	fn fill(&self, metadata: &mut FillMetadata<'_>) -> anyhow::Result<()> {
		let seen = metadata.selection_key().map_or_else(|| "<none>".to_string(), ToString::to_string);
		metadata.set(seen)?;
		Ok(())
	}
}

/// Flat object: the authority sits directly on the account.
#[derive(Debug, Enrich)]
pub struct Account {
	#[enrich(rename = "userId")]
	pub user_id: Option<String>,
	#[fill(key = "userId", handler = AuthorityHandler)]
	pub role: Option<Authority>,
}

impl Account {
	pub fn with_user(user_id: &str) -> Self {
		Self {
			user_id: Some(user_id.to_string()),
			role: None,
		}
	}

	pub fn anonymous() -> Self {
		Self { user_id: None, role: None }
	}
}

/// Nested object: the role cascades into its own authority.
#[derive(Debug, Enrich)]
pub struct User {
	#[enrich(rename = "userId")]
	pub user_id: Option<String>,
	#[fill(key = "userId", handler = RoleHandler)]
	pub role: Option<Role>,
	#[fill(key = "nick", handler = EchoHandler)]
	pub nickname: Option<String>,
}

impl User {
	pub fn with_user(user_id: &str) -> Self {
		Self {
			user_id: Some(user_id.to_string()),
			role: None,
			nickname: None,
		}
	}
}

/// No fillable fields.
#[derive(Debug, Default, Enrich)]
pub struct Plain {
	pub note: String,
}

//! In-memory adapters and app construction for membership tests
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use grouplimit_core::app::{AppBuilderOpts, AppState};
use grouplimit_core::extensions::Extensions;
use grouplimit_core::i18n::Catalog;
use grouplimit_core::nonce::NonceService;
use grouplimit_core::settings::service::SettingsService;
use grouplimit_core::settings::{SettingValue, SettingsRegistry};
use grouplimit_core::App;
use grouplimit_types::error::{ClResult, Error};
use grouplimit_types::group_adapter::{
	CreateGroupData, Group, GroupAdapter, GroupInvite, GroupStatus,
};
use grouplimit_types::meta_adapter::MetaAdapter;
use grouplimit_types::types::{GroupId, Timestamp, UserId};

pub const ADMIN_ROLES: &[&str] = &["SADM"];

// Groups //
//********//
#[derive(Debug)]
struct MemGroup {
	name: String,
	status: GroupStatus,
	members: BTreeSet<UserId>,
	admins: HashSet<UserId>,
	banned: HashSet<UserId>,
	invites: HashMap<UserId, UserId>,
	requests: HashSet<UserId>,
}

impl MemGroup {
	fn new(name: String, status: GroupStatus, members: BTreeSet<UserId>) -> Self {
		Self {
			name,
			status,
			members,
			admins: HashSet::new(),
			banned: HashSet::new(),
			invites: HashMap::new(),
			requests: HashSet::new(),
		}
	}
}

#[derive(Debug, Default)]
pub struct MemGroups {
	groups: Mutex<HashMap<GroupId, MemGroup>>,
	next_id: AtomicUsize,
	pub join_calls: AtomicUsize,
	pub request_calls: AtomicUsize,
	pub accept_calls: AtomicUsize,
}

impl MemGroups {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Create a group whose members are synthetic users 10000..10000+count
	pub fn add_group(&self, status: GroupStatus, member_count: u32) -> GroupId {
		let id = GroupId(u32::try_from(self.next_id.fetch_add(1, Ordering::SeqCst) + 1).unwrap_or(0));
		let members = (0..member_count).map(|i| UserId(10_000 + i)).collect();
		self.groups.lock().insert(id, MemGroup::new(format!("Group {}", id), status, members));
		id
	}

	pub fn set_member_count(&self, group_id: GroupId, count: u32) {
		if let Some(group) = self.groups.lock().get_mut(&group_id) {
			group.members = (0..count).map(|i| UserId(10_000 + i)).collect();
		}
	}

	pub fn member_count(&self, group_id: GroupId) -> u32 {
		self.groups
			.lock()
			.get(&group_id)
			.map_or(0, |g| u32::try_from(g.members.len()).unwrap_or(u32::MAX))
	}

	pub fn native_calls(&self) -> usize {
		self.join_calls.load(Ordering::SeqCst)
			+ self.request_calls.load(Ordering::SeqCst)
			+ self.accept_calls.load(Ordering::SeqCst)
	}

	fn with_group<T>(
		&self,
		group_id: GroupId,
		f: impl FnOnce(&mut MemGroup) -> ClResult<T>,
	) -> ClResult<T> {
		let mut groups = self.groups.lock();
		let group = groups.get_mut(&group_id).ok_or(Error::NotFound)?;
		f(group)
	}
}

fn check_cap(group: &MemGroup, cap: Option<u32>) -> ClResult<()> {
	let count = u32::try_from(group.members.len()).unwrap_or(u32::MAX);
	if cap.is_some_and(|cap| count >= cap) {
		return Err(Error::LimitReached);
	}
	Ok(())
}

#[async_trait]
impl GroupAdapter for MemGroups {
	async fn create_group(&self, creator: UserId, data: &CreateGroupData) -> ClResult<GroupId> {
		let id = self.add_group(data.status, 0);
		self.with_group(id, |g| {
			g.name = data.name.to_string();
			g.members.insert(creator);
			g.admins.insert(creator);
			Ok(())
		})?;
		Ok(id)
	}

	async fn read_group(&self, group_id: GroupId) -> ClResult<Group> {
		self.with_group(group_id, |g| {
			Ok(Group {
				group_id,
				name: g.name.as_str().into(),
				status: g.status,
				total_member_count: u32::try_from(g.members.len()).unwrap_or(u32::MAX),
				created_at: Timestamp(0),
			})
		})
	}

	async fn is_member(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
		Ok(self.with_group(group_id, |g| Ok(g.members.contains(&user_id))).unwrap_or(false))
	}

	async fn is_admin(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
		Ok(self.with_group(group_id, |g| Ok(g.admins.contains(&user_id))).unwrap_or(false))
	}

	async fn is_banned(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
		Ok(self.with_group(group_id, |g| Ok(g.banned.contains(&user_id))).unwrap_or(false))
	}

	async fn has_invite(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
		Ok(self.with_group(group_id, |g| Ok(g.invites.contains_key(&user_id))).unwrap_or(false))
	}

	async fn has_membership_request(&self, group_id: GroupId, user_id: UserId) -> ClResult<bool> {
		Ok(self.with_group(group_id, |g| Ok(g.requests.contains(&user_id))).unwrap_or(false))
	}

	async fn list_invites(&self, user_id: UserId) -> ClResult<Vec<GroupInvite>> {
		let groups = self.groups.lock();
		let mut invites: Vec<GroupInvite> = groups
			.iter()
			.filter_map(|(id, g)| {
				g.invites.get(&user_id).map(|inviter| GroupInvite {
					group_id: *id,
					group_name: g.name.as_str().into(),
					invited_by: *inviter,
					invited_at: Timestamp(0),
				})
			})
			.collect();
		invites.sort_by_key(|i| i.group_id);
		Ok(invites)
	}

	async fn invite_user(&self, group_id: GroupId, user_id: UserId, inviter: UserId) -> ClResult<()> {
		self.with_group(group_id, |g| {
			g.invites.insert(user_id, inviter);
			Ok(())
		})
	}

	async fn ban_user(&self, group_id: GroupId, user_id: UserId) -> ClResult<()> {
		self.with_group(group_id, |g| {
			g.members.remove(&user_id);
			g.banned.insert(user_id);
			Ok(())
		})
	}

	async fn join_group(&self, group_id: GroupId, user_id: UserId, cap: Option<u32>) -> ClResult<()> {
		self.join_calls.fetch_add(1, Ordering::SeqCst);
		self.with_group(group_id, |g| {
			check_cap(g, cap)?;
			g.members.insert(user_id);
			g.invites.remove(&user_id);
			g.requests.remove(&user_id);
			Ok(())
		})
	}

	async fn leave_group(&self, group_id: GroupId, user_id: UserId) -> ClResult<()> {
		self.with_group(group_id, |g| {
			if g.members.remove(&user_id) { Ok(()) } else { Err(Error::NotFound) }
		})
	}

	async fn send_membership_request(
		&self,
		group_id: GroupId,
		user_id: UserId,
		_comments: Option<&str>,
	) -> ClResult<()> {
		self.request_calls.fetch_add(1, Ordering::SeqCst);
		self.with_group(group_id, |g| {
			if !g.requests.insert(user_id) {
				return Err(Error::Conflict("Membership already requested".into()));
			}
			Ok(())
		})
	}

	async fn accept_invite(&self, group_id: GroupId, user_id: UserId, cap: Option<u32>) -> ClResult<()> {
		self.accept_calls.fetch_add(1, Ordering::SeqCst);
		self.with_group(group_id, |g| {
			if !g.invites.contains_key(&user_id) {
				return Err(Error::NotFound);
			}
			check_cap(g, cap)?;
			g.invites.remove(&user_id);
			g.members.insert(user_id);
			Ok(())
		})
	}

	async fn reject_invite(&self, group_id: GroupId, user_id: UserId) -> ClResult<()> {
		self.with_group(group_id, |g| g.invites.remove(&user_id).map(|_| ()).ok_or(Error::NotFound))
	}
}

// Meta //
//******//
#[derive(Debug, Default)]
pub struct MemMeta {
	settings: Mutex<HashMap<String, serde_json::Value>>,
	group_meta: Mutex<HashMap<(GroupId, String), serde_json::Value>>,
}

#[async_trait]
impl MetaAdapter for MemMeta {
	async fn list_settings(
		&self,
		prefix: Option<&[String]>,
	) -> ClResult<HashMap<String, serde_json::Value>> {
		let settings = self.settings.lock();
		Ok(settings
			.iter()
			.filter(|(k, _)| prefix.is_none_or(|p| p.iter().any(|p| k.starts_with(p.as_str()))))
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect())
	}

	async fn read_setting(&self, name: &str) -> ClResult<Option<serde_json::Value>> {
		Ok(self.settings.lock().get(name).cloned())
	}

	async fn update_setting(&self, name: &str, value: Option<serde_json::Value>) -> ClResult<()> {
		let mut settings = self.settings.lock();
		match value {
			Some(v) => settings.insert(name.to_string(), v),
			None => settings.remove(name),
		};
		Ok(())
	}

	async fn read_group_meta(
		&self,
		group_id: GroupId,
		key: &str,
	) -> ClResult<Option<serde_json::Value>> {
		Ok(self.group_meta.lock().get(&(group_id, key.to_string())).cloned())
	}

	async fn update_group_meta(
		&self,
		group_id: GroupId,
		key: &str,
		value: Option<serde_json::Value>,
	) -> ClResult<()> {
		let mut meta = self.group_meta.lock();
		match value {
			Some(v) => meta.insert((group_id, key.to_string()), v),
			None => meta.remove(&(group_id, key.to_string())),
		};
		Ok(())
	}
}

// App //
//*****//
pub const JWT_SECRET: &str = "test-jwt-secret";

pub struct TestEnv {
	pub app: App,
	pub groups: Arc<MemGroups>,
	pub meta: Arc<MemMeta>,
}

impl TestEnv {
	pub async fn new() -> ClResult<Self> {
		let groups = MemGroups::new();
		let meta = Arc::new(MemMeta::default());
		let group_adapter: Arc<dyn GroupAdapter> = groups.clone();
		let meta_adapter: Arc<dyn MetaAdapter> = meta.clone();

		let mut registry = SettingsRegistry::new();
		grouplimit_core::register_settings(&mut registry)?;
		grouplimit_membership::register_settings(&mut registry)?;
		let registry = Arc::new(registry.freeze());
		let settings = Arc::new(SettingsService::new(registry.clone(), meta_adapter.clone(), 10));
		let catalog = Arc::new(Catalog::empty("en_US"));

		let mut extensions = Extensions::new();
		grouplimit_membership::init(
			&mut extensions,
			&settings,
			&meta_adapter,
			&group_adapter,
			&catalog,
		)?;

		let opts = AppBuilderOpts {
			jwt_secret: JWT_SECRET.into(),
			nonce_secret: "test-nonce-secret".into(),
			..AppBuilderOpts::default()
		};
		let nonces = NonceService::new(&opts.nonce_secret)?;

		let app = Arc::new(AppState {
			opts,
			group_adapter,
			meta_adapter,
			settings,
			settings_registry: registry,
			nonces,
			catalog,
			extensions,
		});
		Ok(Self { app, groups, meta })
	}

	pub async fn set(&self, key: &str, value: SettingValue) {
		let res = self.app.settings.set(key, value, ADMIN_ROLES).await;
		assert!(res.is_ok(), "setting {} failed: {:?}", key, res.err());
	}
}

// vim: ts=4

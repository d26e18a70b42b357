//! Admission policy behaviour against in-memory adapters

mod common;

use common::TestEnv;
use grouplimit_core::settings::SettingValue;
use grouplimit_membership::policy::{AdmissionPolicy, EffectiveLimit};
use grouplimit_membership::prefs::GroupPreference;
use grouplimit_membership::settings::{ALLOW_OVERRIDE, DEFAULT_MESSAGE, LIMIT_COUNT, LIMIT_MESSAGE};
use grouplimit_types::group_adapter::GroupStatus;
use grouplimit_types::types::GroupId;
use std::sync::Arc;

fn policy(env: &TestEnv) -> Arc<AdmissionPolicy> {
	match env.app.ext::<Arc<AdmissionPolicy>>() {
		Ok(policy) => policy.clone(),
		Err(err) => unreachable!("policy not registered: {}", err),
	}
}

async fn env() -> TestEnv {
	match TestEnv::new().await {
		Ok(env) => env,
		Err(err) => unreachable!("test env: {}", err),
	}
}

async fn can_admit(policy: &AdmissionPolicy, group_id: GroupId, super_admin: bool) -> bool {
	policy.can_admit(group_id, super_admin).await.unwrap_or(false)
}

async fn set_pref(env: &TestEnv, group_id: GroupId, disable_limit: bool, limit: Option<u32>) {
	let pref = GroupPreference { disable_limit, limit_override: limit };
	let res = policy(env).prefs().save_preference(group_id, &pref).await;
	assert!(res.is_ok());
}

#[tokio::test]
async fn test_below_limit_admits() {
	let env = env().await;
	let policy = policy(&env);
	for count in [0, 1, 19] {
		let group = env.groups.add_group(GroupStatus::Public, count);
		assert!(can_admit(&policy, group, false).await, "count {}", count);
	}
}

#[tokio::test]
async fn test_at_or_above_limit_denies() {
	let env = env().await;
	let policy = policy(&env);
	for count in [20, 21, 500] {
		let group = env.groups.add_group(GroupStatus::Public, count);
		assert!(!can_admit(&policy, group, false).await, "count {}", count);
	}
}

#[tokio::test]
async fn test_super_admin_always_admitted() {
	let env = env().await;
	let policy = policy(&env);
	let group = env.groups.add_group(GroupStatus::Public, 1000);
	set_pref(&env, group, false, Some(0)).await;
	assert!(can_admit(&policy, group, true).await);

	// Even for a group that does not exist
	assert!(can_admit(&policy, GroupId(9999), true).await);
}

#[tokio::test]
async fn test_group_flags_ignored_without_override_permission() {
	let env = env().await;
	let policy = policy(&env);
	env.set(ALLOW_OVERRIDE, SettingValue::Bool(false)).await;

	let disabled = env.groups.add_group(GroupStatus::Public, 20);
	set_pref(&env, disabled, true, None).await;
	assert!(!can_admit(&policy, disabled, false).await);

	let raised = env.groups.add_group(GroupStatus::Public, 20);
	set_pref(&env, raised, false, Some(25)).await;
	assert!(!can_admit(&policy, raised, false).await);
	assert_eq!(policy.effective_limit(raised).await.ok(), Some(EffectiveLimit::Capped(20)));
}

#[tokio::test]
async fn test_disabled_limit_admits_regardless_of_count() {
	let env = env().await;
	let policy = policy(&env);
	let group = env.groups.add_group(GroupStatus::Public, 1000);
	set_pref(&env, group, true, None).await;
	assert!(can_admit(&policy, group, false).await);
	assert_eq!(policy.effective_limit(group).await.ok(), Some(EffectiveLimit::Unbounded));
}

#[tokio::test]
async fn test_default_limit_reached_uses_default_message() {
	let env = env().await;
	let policy = policy(&env);
	let group = env.groups.add_group(GroupStatus::Public, 20);
	assert!(!can_admit(&policy, group, false).await);
	assert_eq!(policy.message().await, DEFAULT_MESSAGE);
}

#[tokio::test]
async fn test_group_override_raises_limit() {
	let env = env().await;
	let policy = policy(&env);
	let group = env.groups.add_group(GroupStatus::Public, 20);
	set_pref(&env, group, false, Some(25)).await;
	assert!(can_admit(&policy, group, false).await);

	env.groups.set_member_count(group, 25);
	assert!(!can_admit(&policy, group, false).await);
}

#[tokio::test]
async fn test_repeated_checks_are_stable() {
	let env = env().await;
	let policy = policy(&env);
	let group = env.groups.add_group(GroupStatus::Public, 19);
	for _ in 0..5 {
		assert!(can_admit(&policy, group, false).await);
	}
	env.groups.set_member_count(group, 20);
	for _ in 0..5 {
		assert!(!can_admit(&policy, group, false).await);
	}
}

#[tokio::test]
async fn test_zero_override_denies_everyone() {
	let env = env().await;
	let policy = policy(&env);
	let group = env.groups.add_group(GroupStatus::Public, 0);
	set_pref(&env, group, false, Some(0)).await;
	assert!(!can_admit(&policy, group, false).await);
	assert_eq!(policy.effective_limit(group).await.ok(), Some(EffectiveLimit::Capped(0)));
}

#[tokio::test]
async fn test_cleared_override_falls_back_to_default() {
	let env = env().await;
	let policy = policy(&env);
	let group = env.groups.add_group(GroupStatus::Public, 20);
	set_pref(&env, group, false, Some(30)).await;
	set_pref(&env, group, false, None).await;
	assert_eq!(policy.effective_limit(group).await.ok(), Some(EffectiveLimit::Capped(20)));
}

#[tokio::test]
async fn test_unknown_group_is_denied() {
	let env = env().await;
	let policy = policy(&env);
	assert!(matches!(policy.can_admit(GroupId(4242), false).await, Ok(false)));
}

#[tokio::test]
async fn test_configured_values_are_used() {
	let env = env().await;
	let policy = policy(&env);
	env.set(LIMIT_COUNT, SettingValue::String("5".into())).await;
	env.set(LIMIT_MESSAGE, SettingValue::String("Group is full".into())).await;

	let group = env.groups.add_group(GroupStatus::Public, 5);
	assert!(!can_admit(&policy, group, false).await);
	assert_eq!(policy.message().await, "Group is full");

	let config = policy.config().await.ok();
	assert_eq!(config.map(|c| (c.default_limit, c.allow_override)), Some((5, true)));
}

#[tokio::test]
async fn test_empty_message_falls_back() {
	let env = env().await;
	let policy = policy(&env);
	env.set(LIMIT_MESSAGE, SettingValue::String("   ".into())).await;
	assert_eq!(policy.message().await, DEFAULT_MESSAGE);
}

// vim: ts=4

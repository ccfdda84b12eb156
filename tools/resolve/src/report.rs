//! Resolved view of an instance group.

use chrono::{DateTime, Utc};
use serde::Serialize;

use instancemgr_api::ReconcileState;
use instancemgr_eks::tags::Tag;
use instancemgr_eks::{EksInstanceGroupContext, EksUserData, InstancePool, OsFamily};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub instance_group: String,
    pub state: ReconcileState,
    pub locked: bool,
    pub os_family: OsFamily,
    pub upgrade_strategy: String,
    pub resource_prefix: String,
    pub scaling_group_name: String,
    pub launch_template_name: String,
    pub launch_configuration_name: String,
    pub role_name: String,
    pub managed_policies: Vec<&'static str>,
    pub tags: Vec<Tag>,
    pub user_data: EksUserData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_pool: Option<InstancePool>,
}

impl Report {
    pub fn resolve(ctx: &EksInstanceGroupContext, at: DateTime<Utc>) -> Self {
        Self {
            instance_group: ctx.instance_group().namespaced_name().to_string(),
            state: ctx.state(),
            locked: ctx.locked(),
            os_family: ctx.os_family(),
            upgrade_strategy: ctx.upgrade_strategy().type_,
            resource_prefix: ctx.resource_prefix().to_string(),
            scaling_group_name: ctx.scaling_group_name().to_string(),
            launch_template_name: ctx.launch_template_name().to_string(),
            launch_configuration_name: ctx.launch_configuration_name(at),
            role_name: ctx.role_name(),
            managed_policies: ctx.managed_policies(),
            tags: ctx.scaling_group_tags(),
            user_data: ctx.user_data(),
            instance_pool: ctx.instance_pool(),
        }
    }
}

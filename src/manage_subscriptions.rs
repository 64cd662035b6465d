use serde_json::json;

use crate::logging::log_action;
use crate::services::{
    AdminContext, AdminError, PlatformService, ServiceResult, SubscriptionPlan, ensure,
    ensure_permission,
};

pub const MANAGE_PERMISSION: &str = "manage_subscriptions";

pub fn list_subscription_plans<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
) -> ServiceResult<()> {
    ensure_permission(ctx, MANAGE_PERMISSION)?;
    let plans = service.list_subscription_plans()?;
    ctx.context.set(
        "subscription_plans",
        plans
            .iter()
            .map(|plan| {
                json!({
                    "id": plan.id,
                    "name": plan.name,
                    "price": plan.price,
                    "duration": plan.duration,
                    "profit_range": [plan.min_profit, plan.max_profit],
                })
            })
            .collect::<Vec<_>>(),
    );
    Ok(())
}

pub fn save_subscription_plan<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
    plan: SubscriptionPlan,
) -> ServiceResult<SubscriptionPlan> {
    ensure_permission(ctx, MANAGE_PERMISSION)?;
    if let Err(err) = validate_plan(&plan) {
        ctx.context.set("error_message", err.to_string());
        return Err(err);
    }
    let saved = service.save_subscription_plan(plan)?;
    log_action(
        service,
        ctx,
        "save_subscription_plan",
        json!({ "id": saved.id, "name": saved.name, "price": saved.price }),
    )?;
    Ok(saved)
}

pub fn delete_subscription_plan<S: PlatformService>(
    service: &S,
    ctx: &mut AdminContext,
    plan_id: &str,
) -> ServiceResult<()> {
    ensure_permission(ctx, MANAGE_PERMISSION)?;
    service.delete_subscription_plan(plan_id)?;
    log_action(
        service,
        ctx,
        "delete_subscription_plan",
        json!({ "id": plan_id }),
    )
}

fn validate_plan(plan: &SubscriptionPlan) -> ServiceResult<()> {
    ensure(
        !plan.name.trim().is_empty(),
        AdminError::Validation("plan name is required".into()),
    )?;
    ensure(
        plan.price >= 0.0,
        AdminError::Validation("plan price is negative".into()),
    )?;
    ensure(
        plan.min_profit <= plan.max_profit,
        AdminError::Validation("profit range inverted".into()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryService;

    fn manager() -> AdminContext {
        let mut ctx = AdminContext::default();
        ctx.user.id = "admin-1".into();
        ctx.user.permissions.insert(MANAGE_PERMISSION.into());
        ctx
    }

    fn plan(name: &str) -> SubscriptionPlan {
        SubscriptionPlan {
            id: None,
            name: name.into(),
            price: 49.0,
            duration: "30d".into(),
            min_profit: 2.0,
            max_profit: 9.0,
        }
    }

    #[test]
    fn plans_published_with_profit_range() {
        let service = InMemoryService::new_with_sample();
        let mut ctx = manager();
        list_subscription_plans(&service, &mut ctx).unwrap();
        let plans = ctx
            .context
            .get("subscription_plans")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(plans[0]["profit_range"], json!([5.0, 18.0]));
    }

    #[test]
    fn blank_name_is_rejected() {
        let service = InMemoryService::default();
        let mut ctx = manager();
        let err = save_subscription_plan(&service, &mut ctx, plan("   ")).unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
        assert!(service.list_subscription_plans().unwrap().is_empty());
    }

    #[test]
    fn inverted_profit_range_is_rejected() {
        let service = InMemoryService::default();
        let mut ctx = manager();
        let mut bad = plan("Starter");
        bad.min_profit = 12.0;
        bad.max_profit = 3.0;
        let err = save_subscription_plan(&service, &mut ctx, bad).unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
    }

    #[test]
    fn save_then_delete_round_trip() {
        let service = InMemoryService::default();
        let mut ctx = manager();
        let saved = save_subscription_plan(&service, &mut ctx, plan("Starter")).unwrap();
        let id = saved.id.unwrap();
        delete_subscription_plan(&service, &mut ctx, &id).unwrap();
        assert!(service.list_subscription_plans().unwrap().is_empty());
    }
}

use crate::services::{AdminContext, PlatformService, ServiceResult};

pub fn log_action<S: PlatformService>(
    service: &S,
    ctx: &AdminContext,
    action: &str,
    details: serde_json::Value,
) -> ServiceResult<()> {
    let actor = (!ctx.user.id.is_empty()).then_some(ctx.user.id.as_str());
    service.log_action(action, actor, &details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryService;
    use serde_json::json;

    #[test]
    fn anonymous_context_logs_without_actor() {
        let service = InMemoryService::default();
        let ctx = AdminContext::default();
        log_action(&service, &ctx, "export_transactions", json!({ "rows": 3 })).unwrap();
        let logs = service.action_logs();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].actor.is_none());
    }
}

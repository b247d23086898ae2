//! # API Gateway Handler
//!
//! Transport-neutral JSON dispatcher over the suppression gate. A REST or
//! RPC front end (or the runtime's stdin loop) maps each request to
//! `method + params` and forwards it here.
//!
//! ## Architecture
//!
//! ```text
//! Transport → ApiGatewayHandler → SuppressionGateService → Registry / Catalog
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::error;

use crate::domain::{SuppressionError, SuppressionListDraft};
use crate::ports::{AdServingApi, CatalogApi, SuppressionCheck, SuppressionListApi};
use crate::service::SuppressionGateService;

/// Default number of audit entries returned by `audit_log`.
pub const DEFAULT_AUDIT_LIMIT: usize = 100;

/// Error from API query handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiQueryError {
    pub code: i32,
    pub message: String,
}

impl ApiQueryError {
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL: i32 = -32603;
    pub const NOT_FOUND: i32 = -32004;

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
        }
    }

    pub fn invalid_params(msg: &str) -> Self {
        Self {
            code: Self::INVALID_PARAMS,
            message: msg.to_string(),
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            code: Self::INTERNAL,
            message: msg.to_string(),
        }
    }
}

impl From<SuppressionError> for ApiQueryError {
    fn from(err: SuppressionError) -> Self {
        let code = match err {
            SuppressionError::Validation { .. } => Self::INVALID_PARAMS,
            SuppressionError::NotFound { .. } => Self::NOT_FOUND,
            SuppressionError::InternalInconsistency { .. } => Self::INTERNAL,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ApiQueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiQueryError {}

#[derive(Debug, Deserialize)]
struct IdentifierParams {
    identifier: String,
}

#[derive(Debug, Deserialize)]
struct ServeParams {
    #[serde(alias = "placementId")]
    placement_id: String,
    #[serde(default, alias = "excludedAdvertisers")]
    excluded_advertisers: HashSet<String>,
}

#[derive(Debug, Deserialize)]
struct ServeForUserParams {
    #[serde(alias = "placementId")]
    placement_id: String,
    identifier: String,
}

#[derive(Debug, Deserialize)]
struct IdParams {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateParams {
    id: String,
    #[serde(flatten)]
    draft: SuppressionListDraft,
}

#[derive(Debug, Default, Deserialize)]
struct LimitParams {
    #[serde(default)]
    limit: Option<usize>,
}

/// API Gateway handler for the suppression gate.
pub struct ApiGatewayHandler {
    service: Arc<SuppressionGateService>,
}

impl ApiGatewayHandler {
    pub fn new(service: Arc<SuppressionGateService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<SuppressionGateService> {
        &self.service
    }

    /// Handle ping request (health check).
    pub fn handle_ping(&self) -> Value {
        json!({
            "status": "ok",
            "subsystem": "suppression-gate"
        })
    }

    pub fn handle_get_stats(&self) -> Value {
        json!({
            "health": self.service.health(),
            "index": self.service.stats(),
        })
    }

    pub fn handle_get_metrics(&self) -> Result<Value, ApiQueryError> {
        to_json(&self.service.metrics_snapshot())
    }

    pub fn handle_check(&self, identifier: &str) -> Result<Value, ApiQueryError> {
        to_json(&self.service.check(identifier)?)
    }

    pub fn handle_serve_ad(&self, placement_id: &str, excluded: &HashSet<String>) -> Value {
        json!({
            "placement_id": placement_id,
            "banner": self.service.serve_ad(placement_id, excluded),
        })
    }

    pub fn handle_serve_ad_for_user(
        &self,
        placement_id: &str,
        identifier: &str,
    ) -> Result<Value, ApiQueryError> {
        to_json(&self.service.serve_ad_for_user(placement_id, identifier)?)
    }

    pub fn handle_create_list(&self, draft: SuppressionListDraft) -> Result<Value, ApiQueryError> {
        to_json(&self.service.create_list(draft)?)
    }

    pub fn handle_list_lists(&self) -> Result<Value, ApiQueryError> {
        to_json(&self.service.list_lists())
    }

    pub fn handle_get_list(&self, id: &str) -> Result<Value, ApiQueryError> {
        match self.service.get_list(id) {
            Some(list) => to_json(&list),
            None => Err(SuppressionError::not_found(id).into()),
        }
    }

    pub fn handle_update_list(
        &self,
        id: &str,
        draft: SuppressionListDraft,
    ) -> Result<Value, ApiQueryError> {
        match self.service.update_list(id, draft)? {
            Some(list) => to_json(&list),
            None => Err(SuppressionError::not_found(id).into()),
        }
    }

    pub fn handle_delete_list(&self, id: &str) -> Result<Value, ApiQueryError> {
        if self.service.delete_list(id)? {
            Ok(json!({ "deleted": true, "id": id }))
        } else {
            Err(SuppressionError::not_found(id).into())
        }
    }

    pub fn handle_get_banners(&self) -> Result<Value, ApiQueryError> {
        to_json(&self.service.all_banners())
    }

    pub fn handle_banner_counts(&self) -> Result<Value, ApiQueryError> {
        to_json(&self.service.banner_counts())
    }

    pub fn handle_audit_log(&self, limit: usize) -> Result<Value, ApiQueryError> {
        to_json(&self.service.audit_log(limit))
    }
}

/// Handle an API query.
///
/// ## Supported Methods
///
/// - `ping`, `get_stats`, `get_metrics`
/// - `check_suppression` `{identifier}`
/// - `serve_ad` `{placement_id, excluded_advertisers?}`
/// - `serve_ad_for_user` `{placement_id, identifier}`
/// - `create_list` `{advertiser_id, name, identifiers, id?}`
/// - `list_lists`, `get_list` `{id}`, `delete_list` `{id}`
/// - `update_list` `{id, advertiser_id, name, identifiers}`
/// - `get_banners`, `banner_counts`
/// - `audit_log` `{limit?}`
pub fn handle_api_query(
    handler: &ApiGatewayHandler,
    method: &str,
    params: &Value,
) -> Result<Value, ApiQueryError> {
    match method {
        "ping" => Ok(handler.handle_ping()),
        "get_stats" => Ok(handler.handle_get_stats()),
        "get_metrics" => handler.handle_get_metrics(),
        "check_suppression" => {
            let p: IdentifierParams = parse_params(params)?;
            handler.handle_check(&p.identifier)
        }
        "serve_ad" => {
            let p: ServeParams = parse_params(params)?;
            Ok(handler.handle_serve_ad(&p.placement_id, &p.excluded_advertisers))
        }
        "serve_ad_for_user" => {
            let p: ServeForUserParams = parse_params(params)?;
            handler.handle_serve_ad_for_user(&p.placement_id, &p.identifier)
        }
        "create_list" => handler.handle_create_list(parse_params(params)?),
        "list_lists" => handler.handle_list_lists(),
        "get_list" => {
            let p: IdParams = parse_params(params)?;
            handler.handle_get_list(&p.id)
        }
        "update_list" => {
            let p: UpdateParams = parse_params(params)?;
            handler.handle_update_list(&p.id, p.draft)
        }
        "delete_list" => {
            let p: IdParams = parse_params(params)?;
            handler.handle_delete_list(&p.id)
        }
        "get_banners" => handler.handle_get_banners(),
        "banner_counts" => handler.handle_banner_counts(),
        "audit_log" => {
            let p: LimitParams = parse_params(params)?;
            handler.handle_audit_log(p.limit.unwrap_or(DEFAULT_AUDIT_LIMIT))
        }
        _ => Err(ApiQueryError::method_not_found(method)),
    }
}

/// Deserialize params. `null` is read as an empty object.
fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T, ApiQueryError> {
    let params = if params.is_null() { json!({}) } else { params.clone() };
    serde_json::from_value(params)
        .map_err(|err| ApiQueryError::invalid_params(&format!("Invalid params: {}", err)))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ApiQueryError> {
    serde_json::to_value(value).map_err(|err| {
        error!(error = %err, "Failed to encode API result");
        ApiQueryError::internal(&format!("Failed to encode result: {}", err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::banner;
    use crate::domain::{AdCatalog, GateConfigBuilder};

    fn handler() -> ApiGatewayHandler {
        let catalog = AdCatalog::new(vec![banner("b1", "adv1", 1), banner("b2", "adv2", 1)]).unwrap();
        let config = GateConfigBuilder::new().audit(true).build().unwrap();
        ApiGatewayHandler::new(Arc::new(SuppressionGateService::new(config, catalog).unwrap()))
    }

    fn call(handler: &ApiGatewayHandler, method: &str, params: Value) -> Result<Value, ApiQueryError> {
        handle_api_query(handler, method, &params)
    }

    #[test]
    fn test_handle_ping() {
        let result = handler().handle_ping();
        assert_eq!(result["status"], "ok");
        assert_eq!(result["subsystem"], "suppression-gate");
    }

    #[test]
    fn test_handle_api_query_unknown() {
        let err = call(&handler(), "unknown_method", Value::Null).unwrap_err();
        assert_eq!(err.code, ApiQueryError::METHOD_NOT_FOUND);
    }

    #[test]
    fn test_list_crud_roundtrip() {
        let h = handler();
        let created = call(
            &h,
            "create_list",
            json!({"advertiser_id": "adv1", "name": "Churned", "identifiers": ["hash_abc"]}),
        )
        .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let check = call(&h, "check_suppression", json!({"identifier": "hash_abc"})).unwrap();
        assert_eq!(check["suppressed_advertisers"], json!(["adv1"]));

        let updated = call(
            &h,
            "update_list",
            json!({"id": id, "advertiserId": "adv2", "name": "Moved", "identifiers": ["hash_abc"]}),
        )
        .unwrap();
        assert_eq!(updated["advertiser_id"], "adv2");
        assert_eq!(updated["created_at"], created["created_at"]);

        assert_eq!(call(&h, "list_lists", Value::Null).unwrap().as_array().unwrap().len(), 1);
        assert_eq!(call(&h, "delete_list", json!({"id": id})).unwrap()["deleted"], true);

        let err = call(&h, "get_list", json!({"id": id})).unwrap_err();
        assert_eq!(err.code, ApiQueryError::NOT_FOUND);
        let err = call(&h, "delete_list", json!({"id": id})).unwrap_err();
        assert_eq!(err.code, ApiQueryError::NOT_FOUND);
    }

    #[test]
    fn test_validation_maps_to_invalid_params() {
        let h = handler();
        let err = call(&h, "create_list", json!({"name": "x", "identifiers": ["a"]})).unwrap_err();
        assert_eq!(err.code, ApiQueryError::INVALID_PARAMS);
        assert!(err.message.contains("advertiser_id"));

        let err = call(&h, "check_suppression", json!({"identifier": ""})).unwrap_err();
        assert_eq!(err.code, ApiQueryError::INVALID_PARAMS);

        let err = call(&h, "check_suppression", Value::Null).unwrap_err();
        assert_eq!(err.code, ApiQueryError::INVALID_PARAMS);
    }

    #[test]
    fn test_encode_failure_is_internal_error() {
        let mut unencodable = std::collections::HashMap::new();
        unencodable.insert((1u8, 2u8), "tuple keys are not JSON object keys");

        let err = to_json(&unencodable).unwrap_err();
        assert_eq!(err.code, ApiQueryError::INTERNAL);
        assert!(err.message.starts_with("Failed to encode result"));
    }

    #[test]
    fn test_unknown_list_reports_id() {
        let err = call(&handler(), "get_list", json!({"id": "list-404"})).unwrap_err();
        let expected: ApiQueryError = SuppressionError::not_found("list-404").into();
        assert_eq!(err, expected);
        assert_eq!(err.message, "Suppression list not found: list-404");
    }

    #[test]
    fn test_update_unknown_list_is_not_found() {
        let err = call(
            &handler(),
            "update_list",
            json!({"id": "nope", "advertiser_id": "a", "name": "n", "identifiers": ["x"]}),
        )
        .unwrap_err();
        assert_eq!(err.code, ApiQueryError::NOT_FOUND);
    }

    #[test]
    fn test_serve_methods() {
        let h = handler();
        let served = call(
            &h,
            "serve_ad",
            json!({"placement_id": "p1", "excluded_advertisers": ["adv1"]}),
        )
        .unwrap();
        assert_eq!(served["banner"]["id"], "b2");

        let none = call(
            &h,
            "serve_ad",
            json!({"placementId": "p1", "excludedAdvertisers": ["adv1", "adv2"]}),
        )
        .unwrap();
        assert!(none["banner"].is_null());

        call(
            &h,
            "create_list",
            json!({"advertiser_id": "adv1", "name": "n", "identifiers": ["u1"]}),
        )
        .unwrap();
        let decision = call(&h, "serve_ad_for_user", json!({"placement_id": "p1", "identifier": "u1"})).unwrap();
        assert_eq!(decision["banner"]["advertiser_id"], "adv2");
        assert_eq!(decision["suppression_info"]["suppressed_advertisers"], json!(["adv1"]));
    }

    #[test]
    fn test_catalog_and_introspection() {
        let h = handler();
        assert_eq!(call(&h, "get_banners", Value::Null).unwrap().as_array().unwrap().len(), 2);
        assert_eq!(call(&h, "banner_counts", Value::Null).unwrap()["adv1"], 1);

        call(&h, "check_suppression", json!({"identifier": "u1"})).unwrap();
        let log = call(&h, "audit_log", json!({"limit": 5})).unwrap();
        assert_eq!(log.as_array().unwrap().len(), 1);
        assert_eq!(log[0]["identifier"], "u1");

        let metrics = call(&h, "get_metrics", Value::Null).unwrap();
        assert_eq!(metrics["checks_performed"], 1);

        let stats = call(&h, "get_stats", Value::Null).unwrap();
        assert_eq!(stats["health"]["total_banners"], 2);
        assert_eq!(stats["index"]["total_lists"], 0);
    }
}

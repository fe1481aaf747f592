//! Inbound HMI responses.

use resumption_types::{
    CorrelationId, CorrelationKey, FunctionId, ResultCode, VehicleDataResultCode,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response delivered by the HMI (or synthesized for a timeout, a refused
/// dispatch, or a replay to a frozen waiter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmiResponse {
    pub function: FunctionId,
    pub correlation_id: CorrelationId,
    pub result_code: ResultCode,
    #[serde(default)]
    pub info: Option<String>,
    /// Per-item results of a vehicle data (un)subscription.
    #[serde(default)]
    pub vehicle_data: BTreeMap<String, VehicleDataResultCode>,
    /// Remaining response parameters, untouched.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl HmiResponse {
    /// A response with the given result code and no parameters.
    pub fn new(key: CorrelationKey, result_code: ResultCode) -> Self {
        Self {
            function: key.function,
            correlation_id: key.correlation_id,
            result_code,
            info: None,
            vehicle_data: BTreeMap::new(),
            payload: serde_json::Value::Null,
        }
    }

    /// A `SUCCESS` response.
    pub fn success(key: CorrelationKey) -> Self {
        Self::new(key, ResultCode::Success)
    }

    /// A negative response standing in for one the HMI never sent.
    pub fn negative(key: CorrelationKey, result_code: ResultCode, info: impl Into<String>) -> Self {
        Self {
            info: Some(info.into()),
            ..Self::new(key, result_code)
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn with_vehicle_data(
        mut self,
        vehicle_data: impl IntoIterator<Item = (String, VehicleDataResultCode)>,
    ) -> Self {
        self.vehicle_data = vehicle_data.into_iter().collect();
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn key(&self) -> CorrelationKey {
        CorrelationKey::new(self.function, self.correlation_id)
    }

    /// Whether the result code is `SUCCESS` or `WARNINGS`.
    pub fn is_successful(&self) -> bool {
        self.result_code.is_success()
    }

    /// The same response addressed to another correlation id.
    pub fn readdressed(&self, correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            ..self.clone()
        }
    }
}

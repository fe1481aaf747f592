//! Inspecting state machine output and scripting HMI answers.

use resumption_core::{Action, RestoreId};
use resumption_messages::{HmiMessage, HmiResponse, MessageKind};
use resumption_types::{
    AppId, CorrelationKey, FunctionId, ResultCode, ResumptionResult, VehicleDataResultCode,
};

/// Every message sent to the HMI, in order.
pub fn sent_messages(actions: &[Action]) -> Vec<HmiMessage> {
    actions
        .iter()
        .filter_map(|action| action.as_hmi_message().cloned())
        .collect()
}

/// Sent requests awaiting a response, in order.
pub fn sent_requests(actions: &[Action]) -> Vec<HmiMessage> {
    sent_messages(actions)
        .into_iter()
        .filter(|message| message.kind == MessageKind::Request)
        .collect()
}

/// Sent messages of one function.
pub fn sent_with_function(actions: &[Action], function: FunctionId) -> Vec<HmiMessage> {
    sent_messages(actions)
        .into_iter()
        .filter(|message| message.function() == function)
        .collect()
}

/// Keys of every timer set.
pub fn timers_set(actions: &[Action]) -> Vec<CorrelationKey> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::SetTimer { key, .. } => Some(*key),
            _ => None,
        })
        .collect()
}

/// Every completion reported, as `(ticket, app, result)`.
pub fn finished(actions: &[Action]) -> Vec<(RestoreId, AppId, ResumptionResult)> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::ResumptionFinished {
                restore_id,
                app_id,
                result,
                ..
            } => Some((*restore_id, *app_id, *result)),
            _ => None,
        })
        .collect()
}

/// Every abandoned ticket.
pub fn abandoned(actions: &[Action]) -> Vec<RestoreId> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::RestoreAbandoned { restore_id, .. } => Some(*restore_id),
            _ => None,
        })
        .collect()
}

/// The response the HMI would send for `message` with `code`.
///
/// # Panics
///
/// Panics if `message` is a notification.
pub fn answer(message: &HmiMessage, code: ResultCode) -> HmiResponse {
    let key = message
        .correlation_key()
        .expect("notifications are never answered");
    HmiResponse::new(key, code)
}

/// A `SUCCESS` response to `message`.
pub fn success(message: &HmiMessage) -> HmiResponse {
    answer(message, ResultCode::Success)
}

/// A successful vehicle data response with explicit per-item codes.
pub fn vehicle_data_answer(
    message: &HmiMessage,
    items: &[(&str, VehicleDataResultCode)],
) -> HmiResponse {
    success(message).with_vehicle_data(
        items
            .iter()
            .map(|(item, code)| (item.to_string(), *code)),
    )
}

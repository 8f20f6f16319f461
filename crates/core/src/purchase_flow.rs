//! Purchase flow state machine.
//!
//! The booking page walks a client through
//! `Loading -> Schedule -> Payment -> Confirm -> Thanks`. The browser drives
//! the transitions. [`PurchaseFlow`] is the reference model of that client
//! flow; the server never holds one, since each capture request is
//! stateless. What the flow has collected on reaching `Confirm` is exactly
//! what [`CaptureContext::from_parts`] demands of a capture request, so the
//! server refuses any capture the flow itself could not have produced.
//!
//! Missing package context always fails closed: the flow exits to package
//! selection instead of continuing with partial information.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money;
use crate::types::Timestamp;

/// Longest package name accepted from a client.
pub const MAX_PACKAGE_NAME_LEN: usize = 255;

/// Longest external order identifier accepted from a client.
pub const MAX_ORDER_ID_LEN: usize = 64;

/// Package the client picked on the pricing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedPackage {
    pub name: String,
    pub price: Decimal,
}

/// Why a flow left the happy path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ExitReason {
    /// Authentication or configuration fetch failed while loading.
    LoadFailed(String),
    /// The selected package was lost; redirect to package selection.
    PackageMissing,
}

/// Steps of the purchase flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStep {
    Loading,
    Schedule,
    Payment,
    Confirm,
    Thanks,
    Exited(ExitReason),
}

impl PurchaseStep {
    /// Terminal steps accept no further events.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchaseStep::Thanks | PurchaseStep::Exited(_))
    }

    fn name(&self) -> &'static str {
        match self {
            PurchaseStep::Loading => "Loading",
            PurchaseStep::Schedule => "Schedule",
            PurchaseStep::Payment => "Payment",
            PurchaseStep::Confirm => "Confirm",
            PurchaseStep::Thanks => "Thanks",
            PurchaseStep::Exited(_) => "Exited",
        }
    }
}

/// Inputs that move the flow forward (or back).
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    /// Session authenticated and gateway config fetched. Carries whatever
    /// package the client found in local storage.
    Initialized { package: Option<SelectedPackage> },
    /// Authentication or config fetch failed.
    InitFailed(String),
    /// A consultation slot was picked.
    TimeSelected(Timestamp),
    /// The payer approved the order with the external processor.
    OrderApproved { order_id: String },
    /// The server confirmed the capture and recorded the purchase.
    CaptureSucceeded,
    /// Client-side storage was cleared mid-flow.
    StorageCleared,
    /// The client pressed a back button.
    Back,
}

impl FlowEvent {
    fn name(&self) -> &'static str {
        match self {
            FlowEvent::Initialized { .. } => "Initialized",
            FlowEvent::InitFailed(_) => "InitFailed",
            FlowEvent::TimeSelected(_) => "TimeSelected",
            FlowEvent::OrderApproved { .. } => "OrderApproved",
            FlowEvent::CaptureSucceeded => "CaptureSucceeded",
            FlowEvent::StorageCleared => "StorageCleared",
            FlowEvent::Back => "Back",
        }
    }
}

/// Errors produced when applying an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Invalid transition: {event} is not allowed in step {from}")]
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },
    #[error("No package selected; returning to package selection")]
    PackageMissing,
    #[error("Order id must not be empty")]
    EmptyOrderId,
}

/// Client-side purchase flow, kept as the executable model the booking
/// page follows.
#[derive(Debug, Clone)]
pub struct PurchaseFlow {
    step: PurchaseStep,
    package: Option<SelectedPackage>,
    consultation_time: Option<Timestamp>,
    order_id: Option<String>,
}

impl Default for PurchaseFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl PurchaseFlow {
    /// A fresh flow sitting in `Loading`.
    pub fn new() -> Self {
        Self {
            step: PurchaseStep::Loading,
            package: None,
            consultation_time: None,
            order_id: None,
        }
    }

    pub fn step(&self) -> &PurchaseStep {
        &self.step
    }

    pub fn package(&self) -> Option<&SelectedPackage> {
        self.package.as_ref()
    }

    pub fn consultation_time(&self) -> Option<Timestamp> {
        self.consultation_time
    }

    pub fn order_id(&self) -> Option<&str> {
        self.order_id.as_deref()
    }

    /// Apply an event, returning the new step.
    ///
    /// A missing package moves the flow to
    /// `Exited(PackageMissing)` and returns [`FlowError::PackageMissing`].
    /// Any other rejected event leaves the flow untouched.
    pub fn apply(&mut self, event: FlowEvent) -> Result<&PurchaseStep, FlowError> {
        let invalid = FlowError::InvalidTransition {
            from: self.step.name(),
            event: event.name(),
        };

        if self.step.is_terminal() {
            return Err(invalid);
        }

        match (self.step.clone(), event) {
            (_, FlowEvent::StorageCleared) => {
                self.package = None;
                return self.fail_closed();
            }

            (PurchaseStep::Loading, FlowEvent::Initialized { package }) => match package {
                Some(package) => {
                    self.package = Some(package);
                    self.step = PurchaseStep::Schedule;
                }
                None => return self.fail_closed(),
            },
            (PurchaseStep::Loading, FlowEvent::InitFailed(msg)) => {
                self.step = PurchaseStep::Exited(ExitReason::LoadFailed(msg));
            }

            (PurchaseStep::Schedule, FlowEvent::TimeSelected(at)) => {
                if self.package.is_none() {
                    return self.fail_closed();
                }
                self.consultation_time = Some(at);
                self.step = PurchaseStep::Payment;
            }

            (PurchaseStep::Payment, FlowEvent::OrderApproved { order_id }) => {
                if order_id.trim().is_empty() {
                    return Err(FlowError::EmptyOrderId);
                }
                self.order_id = Some(order_id);
                self.step = PurchaseStep::Confirm;
            }
            (PurchaseStep::Payment, FlowEvent::Back) => {
                self.step = PurchaseStep::Schedule;
            }

            (PurchaseStep::Confirm, FlowEvent::CaptureSucceeded) => {
                self.step = PurchaseStep::Thanks;
            }
            (PurchaseStep::Confirm, FlowEvent::Back) => {
                self.order_id = None;
                self.step = PurchaseStep::Payment;
            }

            _ => return Err(invalid),
        }

        Ok(&self.step)
    }

    /// The capture request this flow submits from `Confirm`.
    pub fn capture_context(&self) -> Option<CaptureContext> {
        if self.step != PurchaseStep::Confirm {
            return None;
        }
        Some(CaptureContext {
            order_id: self.order_id.clone()?,
            package: self.package.clone()?,
            consultation_time: self.consultation_time?,
        })
    }

    fn fail_closed(&mut self) -> Result<&PurchaseStep, FlowError> {
        self.step = PurchaseStep::Exited(ExitReason::PackageMissing);
        Err(FlowError::PackageMissing)
    }
}

/// Everything a capture request must carry to be recorded.
///
/// Built by the server from the request body; missing package context is
/// rejected before the payment processor is contacted.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureContext {
    pub order_id: String,
    pub package: SelectedPackage,
    pub consultation_time: Timestamp,
}

impl CaptureContext {
    /// Validate raw capture inputs.
    pub fn from_parts(
        order_id: &str,
        package_name: Option<&str>,
        package_price: &serde_json::Value,
        consultation_time: Option<Timestamp>,
    ) -> Result<Self, CoreError> {
        let order_id = validate_order_id(order_id)?;

        let name = package_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                CoreError::Validation("Package selection is missing; choose a package again".into())
            })?;
        if name.chars().count() > MAX_PACKAGE_NAME_LEN {
            return Err(CoreError::Validation(format!(
                "Package name must be at most {MAX_PACKAGE_NAME_LEN} characters"
            )));
        }

        let price = money::parse_amount(package_price)?;

        let consultation_time = consultation_time.ok_or_else(|| {
            CoreError::Validation("Consultation time is required".into())
        })?;

        Ok(Self {
            order_id,
            package: SelectedPackage {
                name: name.to_string(),
                price,
            },
            consultation_time,
        })
    }
}

/// Trim and bound an external order id.
pub fn validate_order_id(order_id: &str) -> Result<String, CoreError> {
    let trimmed = order_id.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Order id is required".into()));
    }
    let well_formed = trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if trimmed.len() > MAX_ORDER_ID_LEN || !well_formed {
        return Err(CoreError::Validation("Order id is malformed".into()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn big_leagues() -> SelectedPackage {
        SelectedPackage {
            name: "Big Leagues".into(),
            price: Decimal::new(8500, 2),
        }
    }

    fn slot() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2025, 3, 1, 15, 0, 0).unwrap()
    }

    #[test]
    fn happy_path_reaches_thanks() {
        let mut flow = PurchaseFlow::new();
        flow.apply(FlowEvent::Initialized { package: Some(big_leagues()) }).unwrap();
        assert_eq!(flow.step(), &PurchaseStep::Schedule);

        flow.apply(FlowEvent::TimeSelected(slot())).unwrap();
        assert_eq!(flow.step(), &PurchaseStep::Payment);

        flow.apply(FlowEvent::OrderApproved { order_id: "5O190127TN364715T".into() }).unwrap();
        assert_eq!(flow.step(), &PurchaseStep::Confirm);

        flow.apply(FlowEvent::CaptureSucceeded).unwrap();
        assert_eq!(flow.step(), &PurchaseStep::Thanks);
        assert!(flow.step().is_terminal());
        assert_eq!(flow.consultation_time(), Some(slot()));
        assert_eq!(flow.order_id(), Some("5O190127TN364715T"));
    }

    #[test]
    fn missing_package_on_load_fails_closed() {
        let mut flow = PurchaseFlow::new();
        let err = flow.apply(FlowEvent::Initialized { package: None }).unwrap_err();
        assert_eq!(err, FlowError::PackageMissing);
        assert_eq!(flow.step(), &PurchaseStep::Exited(ExitReason::PackageMissing));
    }

    #[test]
    fn storage_cleared_before_payment_exits_to_packages() {
        let mut flow = PurchaseFlow::new();
        flow.apply(FlowEvent::Initialized { package: Some(big_leagues()) }).unwrap();
        let err = flow.apply(FlowEvent::StorageCleared).unwrap_err();
        assert_eq!(err, FlowError::PackageMissing);
        assert!(flow.package().is_none());

        // Terminal: nothing moves the flow afterwards.
        assert_matches!(
            flow.apply(FlowEvent::TimeSelected(slot())),
            Err(FlowError::InvalidTransition { .. })
        );
    }

    #[test]
    fn load_failure_is_terminal() {
        let mut flow = PurchaseFlow::new();
        flow.apply(FlowEvent::InitFailed("session expired".into())).unwrap();
        assert_eq!(
            flow.step(),
            &PurchaseStep::Exited(ExitReason::LoadFailed("session expired".into()))
        );
    }

    #[test]
    fn back_navigation() {
        let mut flow = PurchaseFlow::new();
        flow.apply(FlowEvent::Initialized { package: Some(big_leagues()) }).unwrap();
        flow.apply(FlowEvent::TimeSelected(slot())).unwrap();
        flow.apply(FlowEvent::Back).unwrap();
        assert_eq!(flow.step(), &PurchaseStep::Schedule);

        flow.apply(FlowEvent::TimeSelected(slot())).unwrap();
        flow.apply(FlowEvent::OrderApproved { order_id: "ORDER1".into() }).unwrap();
        flow.apply(FlowEvent::Back).unwrap();
        assert_eq!(flow.step(), &PurchaseStep::Payment);
        assert!(flow.order_id().is_none());
    }

    #[test]
    fn out_of_order_events_are_rejected_without_side_effects() {
        let mut flow = PurchaseFlow::new();
        flow.apply(FlowEvent::Initialized { package: Some(big_leagues()) }).unwrap();

        let err = flow.apply(FlowEvent::CaptureSucceeded).unwrap_err();
        assert_eq!(
            err,
            FlowError::InvalidTransition { from: "Schedule", event: "CaptureSucceeded" }
        );
        assert_eq!(flow.step(), &PurchaseStep::Schedule);
    }

    #[test]
    fn empty_order_id_is_rejected() {
        let mut flow = PurchaseFlow::new();
        flow.apply(FlowEvent::Initialized { package: Some(big_leagues()) }).unwrap();
        flow.apply(FlowEvent::TimeSelected(slot())).unwrap();
        assert_eq!(
            flow.apply(FlowEvent::OrderApproved { order_id: "  ".into() }).unwrap_err(),
            FlowError::EmptyOrderId
        );
        assert_eq!(flow.step(), &PurchaseStep::Payment);
    }

    #[test]
    fn capture_context_requires_package_and_time() {
        let price = serde_json::json!(85.00);

        let ctx = CaptureContext::from_parts("ORDER-1", Some("Big Leagues"), &price, Some(slot()))
            .unwrap();
        assert_eq!(ctx.package, big_leagues());

        assert_matches!(
            CaptureContext::from_parts("ORDER-1", None, &price, Some(slot())),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            CaptureContext::from_parts("ORDER-1", Some("  "), &price, Some(slot())),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            CaptureContext::from_parts("ORDER-1", Some("Big Leagues"), &price, None),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            CaptureContext::from_parts("", Some("Big Leagues"), &price, Some(slot())),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn flow_at_confirm_yields_the_context_the_server_accepts() {
        let mut flow = PurchaseFlow::new();
        flow.apply(FlowEvent::Initialized { package: Some(big_leagues()) }).unwrap();
        flow.apply(FlowEvent::TimeSelected(slot())).unwrap();
        assert_eq!(flow.capture_context(), None);

        flow.apply(FlowEvent::OrderApproved { order_id: "5O190127TN364715T".into() }).unwrap();
        let from_flow = flow.capture_context().unwrap();

        let package = flow.package().unwrap();
        let from_request = CaptureContext::from_parts(
            flow.order_id().unwrap(),
            Some(&package.name),
            &serde_json::json!(package.price.to_string()),
            flow.consultation_time(),
        )
        .unwrap();
        assert_eq!(from_flow, from_request);

        flow.apply(FlowEvent::CaptureSucceeded).unwrap();
        assert_eq!(flow.capture_context(), None);
    }

    #[test]
    fn order_id_rejects_path_characters() {
        assert_matches!(validate_order_id("../admin"), Err(CoreError::Validation(_)));
        assert_eq!(validate_order_id(" 8AB12 ").unwrap(), "8AB12");
    }
}

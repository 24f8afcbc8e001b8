//! Locker assignment.

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use super::{
    AdminService, authorize, parse_member_id,
    response::{AdminResponse, Flash, GENERIC_FAILURE, RedirectTarget, failure_message},
};
use crate::{
    audit,
    error::{AdminError, Result},
    security::{Capability, Operator, audit::AuditEventType},
};

/// Locker assignment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockerForm {
    /// Public member id.
    pub member_id: String,
    /// Locker to assign.
    pub locker_no: u32,
}

impl AdminService {
    /// Gives a locker to a member whose subscription is running.
    ///
    /// The subscription is checked before any locker row is touched. A
    /// member's previous locker is released.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Forbidden`] without the `locker.assign`
    /// capability.
    #[instrument(skip(self, operator, form), fields(operator = operator.name(), locker_no = form.locker_no))]
    pub fn assign_locker(&self, operator: &Operator, form: &LockerForm) -> Result<AdminResponse> {
        let request_id = Uuid::new_v4();
        authorize(operator, Capability::LockerAssign, request_id)?;
        let today = self.clock.today();

        let outcome = self.store.transaction(|tx| {
            let member_id = parse_member_id(&form.member_id)?;
            let member = tx.member(&member_id)?;
            if !member.has_active_subscription(today) {
                return Err(AdminError::NoActiveSubscription);
            }
            tx.assign_locker(&member, form.locker_no)?;
            Ok(member_id)
        });

        let flash = match outcome {
            Ok(member_id) => {
                audit!(
                    AuditEventType::LockerAssigned,
                    operator.name(),
                    request_id,
                    with_member_id(member_id.as_str()),
                    with_locker_no(form.locker_no),
                );
                Flash::success("Locker assigned successfully")
            }
            Err(err) => Flash::error(failure_message(&err, GENERIC_FAILURE)),
        };
        Ok(AdminResponse::redirect(RedirectTarget::Back, flash))
    }
}

//! Member listing, registration, edits, deletion and status toggling.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    AdminService, authorize, parse_member_id,
    response::{Ack, AdminResponse, Flash, GENERIC_FAILURE, RedirectTarget, failure_message},
};
use crate::{
    audit,
    error::{ErrorClass, Result},
    membership::{Locker, Member, MemberId, MemberUpdate, NewMember},
    security::{Capability, Operator, audit::AuditEventType},
    subscriptions::models::{SubscriptionPlan, SubscriptionRecord},
};

/// Members index page.
#[derive(Debug, Clone, Serialize)]
pub struct MemberList {
    /// Live members, newest first.
    pub members: Vec<Member>,
}

/// Registration page.
#[derive(Debug, Clone, Serialize)]
pub struct CreateForm {
    /// Unused member id proposed for the new member.
    pub member_id: MemberId,
    /// Lockers nobody holds.
    pub lockers: Vec<Locker>,
    /// Accepted payment methods.
    pub payment_gateways: Vec<String>,
    /// Plans open for new subscriptions.
    pub plans: Vec<SubscriptionPlan>,
}

/// Member detail page.
#[derive(Debug, Clone, Serialize)]
pub struct MemberProfile {
    /// The member with its profile and current subscription.
    pub member: Member,
    /// Lockers nobody holds.
    pub lockers: Vec<Locker>,
    /// Accepted payment methods.
    pub payment_gateways: Vec<String>,
    /// Plans open for new subscriptions.
    pub plans: Vec<SubscriptionPlan>,
    /// Subscription history, newest first.
    pub subscriptions: Vec<SubscriptionRecord>,
}

/// Member edit page.
#[derive(Debug, Clone, Serialize)]
pub struct EditForm {
    /// The member being edited.
    pub member: Member,
    /// Lockers nobody holds.
    pub lockers: Vec<Locker>,
}

/// Status toggle request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusForm {
    /// Public member id.
    pub id: String,
}

impl AdminService {
    /// Lists live members.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Forbidden`](crate::error::AdminError::Forbidden)
    /// or a store error.
    pub fn list_members(&self, operator: &Operator) -> Result<MemberList> {
        authorize(operator, Capability::MemberList, Uuid::new_v4())?;
        let members = self.store.read(|tx| tx.members())?;
        Ok(MemberList { members })
    }

    /// Prepares the registration page with a fresh member id.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Forbidden`](crate::error::AdminError::Forbidden)
    /// or a store error.
    pub fn create_form(&self, operator: &Operator) -> Result<CreateForm> {
        authorize(operator, Capability::MemberCreate, Uuid::new_v4())?;
        let (member_id, lockers) =
            self.store.read(|tx| Ok((tx.unique_member_id()?, tx.available_lockers()?)))?;
        Ok(CreateForm {
            member_id,
            lockers,
            payment_gateways: self.engine.payment_gateways().to_vec(),
            plans: self.engine.catalog().offered().cloned().collect(),
        })
    }

    /// Registers a member and its user profile.
    ///
    /// Uses the id proposed on the create form when given, otherwise draws a
    /// fresh one. A requested locker is assigned in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Forbidden`](crate::error::AdminError::Forbidden)
    /// without the `member.store` capability.
    #[instrument(skip(self, operator, form), fields(operator = operator.name()))]
    pub fn store_member(&self, operator: &Operator, form: &NewMember) -> Result<AdminResponse> {
        let request_id = Uuid::new_v4();
        authorize(operator, Capability::MemberStore, request_id)?;
        let today = self.clock.today();
        let now = self.clock.now();

        let outcome = self.store.transaction(|tx| {
            form.validate(today)?;
            let member_id = match form.member_id.as_deref().map(str::trim) {
                Some(raw) if !raw.is_empty() => MemberId::new(raw)?,
                _ => tx.unique_member_id()?,
            };
            let member = tx.insert_member(&member_id, form, now)?;
            if let Some(locker_no) = form.locker_no {
                tx.assign_locker(&member, locker_no)?;
            }
            Ok(member_id)
        });

        match outcome {
            Ok(member_id) => {
                audit!(
                    AuditEventType::MemberRegistered,
                    operator.name(),
                    request_id,
                    with_member_id(member_id.as_str()),
                );
                Ok(AdminResponse::redirect(
                    RedirectTarget::EditMember(member_id),
                    Flash::success("Member Registered successfully"),
                ))
            }
            Err(err) => Ok(AdminResponse::redirect(
                RedirectTarget::Back,
                Flash::error(failure_message(&err, "Member Registration failed")),
            )),
        }
    }

    /// Loads a member with everything the detail page offers.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Forbidden`](crate::error::AdminError::Forbidden),
    /// [`AdminError::MemberNotFound`](crate::error::AdminError::MemberNotFound)
    /// or a store error.
    pub fn show_member(&self, operator: &Operator, member_id: &str) -> Result<MemberProfile> {
        authorize(operator, Capability::MemberView, Uuid::new_v4())?;
        let member_id = parse_member_id(member_id)?;
        let (member, lockers, subscriptions) = self.store.read(|tx| {
            Ok((tx.member(&member_id)?, tx.available_lockers()?, tx.subscriptions_of(&member_id)?))
        })?;
        Ok(MemberProfile {
            member,
            lockers,
            payment_gateways: self.engine.payment_gateways().to_vec(),
            plans: self.engine.catalog().offered().cloned().collect(),
            subscriptions,
        })
    }

    /// Loads a member for editing.
    ///
    /// # Errors
    ///
    /// Same as [`show_member`](Self::show_member).
    pub fn edit_member(&self, operator: &Operator, member_id: &str) -> Result<EditForm> {
        authorize(operator, Capability::MemberEdit, Uuid::new_v4())?;
        let member_id = parse_member_id(member_id)?;
        let (member, lockers) =
            self.store.read(|tx| Ok((tx.member(&member_id)?, tx.available_lockers()?)))?;
        Ok(EditForm { member, lockers })
    }

    /// Updates a member's user profile.
    ///
    /// Invalid input redirects back to the form; any other failure lands on
    /// the members index.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Forbidden`](crate::error::AdminError::Forbidden)
    /// without the `member.update` capability.
    #[instrument(skip(self, operator, form), fields(operator = operator.name()))]
    pub fn update_member(
        &self,
        operator: &Operator,
        member_id: &str,
        form: &MemberUpdate,
    ) -> Result<AdminResponse> {
        let request_id = Uuid::new_v4();
        authorize(operator, Capability::MemberUpdate, request_id)?;
        let today = self.clock.today();

        let outcome = self.store.transaction(|tx| {
            form.validate(today)?;
            let member_id = parse_member_id(member_id)?;
            let mut member = tx.member(&member_id)?;
            form.apply_to(&mut member.user);
            tx.update_user(&member.user)?;
            Ok(member_id)
        });

        match outcome {
            Ok(member_id) => {
                audit!(
                    AuditEventType::MemberUpdated,
                    operator.name(),
                    request_id,
                    with_member_id(member_id.as_str()),
                );
                Ok(AdminResponse::redirect(
                    RedirectTarget::MembersIndex,
                    Flash::success("Member Updated successfully"),
                ))
            }
            Err(err) => {
                let target = match err.class() {
                    ErrorClass::Validation => RedirectTarget::Back,
                    _ => RedirectTarget::MembersIndex,
                };
                Ok(AdminResponse::redirect(
                    target,
                    Flash::error(failure_message(&err, "Member Update failed")),
                ))
            }
        }
    }

    /// Soft-deletes a member and releases its locker.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Forbidden`](crate::error::AdminError::Forbidden)
    /// without the `member.delete` capability.
    #[instrument(skip(self, operator), fields(operator = operator.name()))]
    pub fn destroy_member(&self, operator: &Operator, member_id: &str) -> Result<AdminResponse> {
        let request_id = Uuid::new_v4();
        authorize(operator, Capability::MemberDelete, request_id)?;
        let now = self.clock.now();

        let outcome = self.store.transaction(|tx| {
            let member_id = parse_member_id(member_id)?;
            tx.soft_delete_member(&member_id, now)?;
            Ok(member_id)
        });

        let flash = match outcome {
            Ok(member_id) => {
                audit!(
                    AuditEventType::MemberDeleted,
                    operator.name(),
                    request_id,
                    with_member_id(member_id.as_str()),
                );
                Flash::success("Member Deleted successfully")
            }
            Err(err) => Flash::error(failure_message(&err, GENERIC_FAILURE)),
        };
        Ok(AdminResponse::redirect(RedirectTarget::MembersIndex, flash))
    }

    /// Toggles a member between active and inactive.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Forbidden`](crate::error::AdminError::Forbidden)
    /// without the `member.update` capability.
    #[instrument(skip(self, operator, form), fields(operator = operator.name(), member_id = %form.id))]
    pub fn change_status(&self, operator: &Operator, form: &StatusForm) -> Result<AdminResponse> {
        let request_id = Uuid::new_v4();
        authorize(operator, Capability::MemberUpdate, request_id)?;

        let outcome = self.store.transaction(|tx| {
            let member_id = parse_member_id(&form.id)?;
            let status = tx.member(&member_id)?.status.toggled();
            tx.set_member_status(&member_id, status)?;
            Ok((member_id, status))
        });

        let ack = match outcome {
            Ok((member_id, status)) => {
                debug!(status = status.as_str(), "member status toggled");
                audit!(
                    AuditEventType::MemberStatusChanged,
                    operator.name(),
                    request_id,
                    with_member_id(member_id.as_str()),
                );
                Ack { message: "Member Status changed successfully".to_owned(), success: true }
            }
            Err(err) => Ack { message: failure_message(&err, GENERIC_FAILURE), success: false },
        };
        Ok(AdminResponse::Ack(ack))
    }
}

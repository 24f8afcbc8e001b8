//! Member and user profile rows.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use super::StoreTx;
use crate::{
    error::{AdminError, Result},
    membership::{Member, MemberId, MemberStatus, NewMember, User},
};

const MAX_ID_ATTEMPTS: usize = 64;

const MEMBER_SELECT: &str = "
SELECT m.id, m.member_id, m.status, m.locker_no, m.subscription_id, m.created_at,
       u.id, u.name, u.email, u.phone, u.address, u.image, u.date_of_birth
FROM members m
JOIN users u ON u.id = m.user_id
WHERE m.deleted_at IS NULL";

struct MemberRow {
    member: Member,
    subscription_id: Option<i64>,
}

fn member_row(row: &Row<'_>) -> rusqlite::Result<MemberRow> {
    let user = User {
        id: row.get(6)?,
        name: row.get(7)?,
        email: row.get(8)?,
        phone: row.get(9)?,
        address: row.get(10)?,
        image: row.get(11)?,
        date_of_birth: row.get(12)?,
    };
    Ok(MemberRow {
        member: Member {
            id: row.get(0)?,
            member_id: row.get(1)?,
            status: row.get(2)?,
            locker_no: row.get(3)?,
            current_subscription: None,
            created_at: row.get(5)?,
            user,
        },
        subscription_id: row.get(4)?,
    })
}

impl StoreTx<'_> {
    fn hydrate(&self, row: MemberRow) -> Result<Member> {
        let mut member = row.member;
        if let Some(id) = row.subscription_id {
            member.current_subscription = self.find_subscription(id)?;
        }
        Ok(member)
    }

    /// Loads a live member by public id.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::MemberNotFound`] if the member does not exist or was deleted.
    pub fn member(&self, member_id: &MemberId) -> Result<Member> {
        let sql = format!("{MEMBER_SELECT} AND m.member_id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![member_id], member_row)
            .optional()?
            .ok_or_else(|| AdminError::MemberNotFound(member_id.to_string()))?;
        self.hydrate(row)
    }

    /// Lists live members, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`] on query failure.
    pub fn members(&self) -> Result<Vec<Member>> {
        let sql = format!("{MEMBER_SELECT} ORDER BY m.id DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], member_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    /// True if any member row, deleted or not, uses `member_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`] on query failure.
    pub fn member_id_taken(&self, member_id: &MemberId) -> Result<bool> {
        let taken = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM members WHERE member_id = ?1)",
            params![member_id],
            |row| row.get(0),
        )?;
        Ok(taken)
    }

    /// Draws member ids until one is unused.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Internal`] if no free id is found after a bounded
    /// number of draws.
    pub fn unique_member_id(&self) -> Result<MemberId> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = MemberId::generate();
            if !self.member_id_taken(&candidate)? {
                return Ok(candidate);
            }
        }
        Err(AdminError::Internal("member id space exhausted".to_owned()))
    }

    /// Inserts a user profile and its member row with status active.
    ///
    /// Does not assign the requested locker; see [`StoreTx::assign_locker`].
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Validation`] if `member_id` is already used, or
    /// [`AdminError::Database`] on write failure.
    pub fn insert_member(
        &self,
        member_id: &MemberId,
        form: &NewMember,
        created_at: DateTime<Utc>,
    ) -> Result<Member> {
        if self.member_id_taken(member_id)? {
            return Err(AdminError::validation(format!(
                "The member id {member_id} has already been taken."
            )));
        }
        self.conn.execute(
            "INSERT INTO users (name, email, phone, address, image, date_of_birth)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                form.name.trim(),
                form.email,
                form.phone,
                form.address,
                form.image,
                form.date_of_birth
            ],
        )?;
        let user_id = self.conn.last_insert_rowid();
        self.conn.execute(
            "INSERT INTO members (member_id, user_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![member_id, user_id, MemberStatus::Active, created_at],
        )?;
        self.member(member_id)
    }

    /// Writes every profile field of `user`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`] on write failure.
    pub fn update_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET name = ?1, email = ?2, phone = ?3, address = ?4, image = ?5,
                              date_of_birth = ?6
             WHERE id = ?7",
            params![
                user.name,
                user.email,
                user.phone,
                user.address,
                user.image,
                user.date_of_birth,
                user.id
            ],
        )?;
        Ok(())
    }

    /// Sets a member's status.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::MemberNotFound`] if no live member matches.
    pub fn set_member_status(&self, member_id: &MemberId, status: MemberStatus) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE members SET status = ?1 WHERE member_id = ?2 AND deleted_at IS NULL",
            params![status, member_id],
        )?;
        if changed == 0 {
            return Err(AdminError::MemberNotFound(member_id.to_string()));
        }
        Ok(())
    }

    /// Marks a member deleted and releases its locker.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::MemberNotFound`] if no live member matches.
    pub fn soft_delete_member(&self, member_id: &MemberId, at: DateTime<Utc>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE members SET deleted_at = ?1, locker_no = NULL
             WHERE member_id = ?2 AND deleted_at IS NULL",
            params![at, member_id],
        )?;
        if changed == 0 {
            return Err(AdminError::MemberNotFound(member_id.to_string()));
        }
        self.release_lockers_of(member_id)
    }

    pub(super) fn set_member_locker(&self, member_id: &MemberId, locker: Option<u32>) -> Result<()> {
        self.conn.execute(
            "UPDATE members SET locker_no = ?1 WHERE member_id = ?2",
            params![locker, member_id],
        )?;
        Ok(())
    }

    pub(super) fn set_current_subscription(&self, member_id: &MemberId, id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE members SET subscription_id = ?1 WHERE member_id = ?2",
            params![id, member_id],
        )?;
        Ok(())
    }
}

//! Locker registry rows.

use rusqlite::{OptionalExtension, Row, params};

use super::StoreTx;
use crate::{
    error::{AdminError, Result},
    membership::{Locker, Member, MemberId},
};

fn locker_row(row: &Row<'_>) -> rusqlite::Result<Locker> {
    Ok(Locker { number: row.get(0)?, available: row.get(1)?, member_id: row.get(2)? })
}

impl StoreTx<'_> {
    /// Registers lockers `1..=count`; existing lockers are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`] on write failure.
    pub fn seed_lockers(&self, count: u32) -> Result<()> {
        let mut stmt = self.conn.prepare("INSERT OR IGNORE INTO lockers (number) VALUES (?1)")?;
        for number in 1..=count {
            stmt.execute(params![number])?;
        }
        Ok(())
    }

    /// Loads a locker by number.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::LockerNotFound`] for unknown numbers.
    pub fn locker(&self, number: u32) -> Result<Locker> {
        self.conn
            .query_row(
                "SELECT number, available, member_id FROM lockers WHERE number = ?1",
                params![number],
                locker_row,
            )
            .optional()?
            .ok_or(AdminError::LockerNotFound(number))
    }

    /// Lists lockers nobody holds, lowest number first.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`] on query failure.
    pub fn available_lockers(&self) -> Result<Vec<Locker>> {
        let mut stmt = self.conn.prepare(
            "SELECT number, available, member_id FROM lockers WHERE available = 1 ORDER BY number",
        )?;
        let lockers = stmt.query_map([], locker_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lockers)
    }

    /// Gives locker `number` to `member`, releasing the member's previous locker.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::LockerNotFound`] or [`AdminError::LockerUnavailable`]
    /// before anything is written.
    pub fn assign_locker(&self, member: &Member, number: u32) -> Result<Locker> {
        let locker = self.locker(number)?;
        if !locker.can_be_taken_by(&member.member_id) {
            return Err(AdminError::LockerUnavailable(number));
        }
        if let Some(previous) = member.locker_no.filter(|&previous| previous != number) {
            self.release_locker(previous)?;
        }
        self.conn.execute(
            "UPDATE lockers SET available = 0, member_id = ?1 WHERE number = ?2",
            params![member.member_id, number],
        )?;
        self.set_member_locker(&member.member_id, Some(number))?;
        self.locker(number)
    }

    /// Marks a locker available again.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`] on write failure.
    pub fn release_locker(&self, number: u32) -> Result<()> {
        self.conn.execute(
            "UPDATE lockers SET available = 1, member_id = NULL WHERE number = ?1",
            params![number],
        )?;
        Ok(())
    }

    pub(super) fn release_lockers_of(&self, member_id: &MemberId) -> Result<()> {
        self.conn.execute(
            "UPDATE lockers SET available = 1, member_id = NULL WHERE member_id = ?1",
            params![member_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::AdminError,
        membership::{MemberId, NewMember},
        store::Store,
    };

    fn store_with_member(id: &str) -> (Store, MemberId) {
        let store = Store::open_in_memory().unwrap();
        let member_id = MemberId::new(id).unwrap();
        let form = NewMember { name: "Ana".into(), ..NewMember::default() };
        store
            .transaction(|tx| {
                tx.seed_lockers(3)?;
                tx.insert_member(&member_id, &form, chrono::Utc::now())
            })
            .unwrap();
        (store, member_id)
    }

    #[test]
    fn test_seed_is_idempotent() {
        let (store, _) = store_with_member("MEM-000001");
        store.transaction(|tx| tx.seed_lockers(3)).unwrap();
        assert_eq!(store.read(|tx| tx.available_lockers()).unwrap().len(), 3);
    }

    #[test]
    fn test_assign_moves_locker() {
        let (store, id) = store_with_member("MEM-000001");
        store
            .transaction(|tx| {
                let member = tx.member(&id)?;
                tx.assign_locker(&member, 1)
            })
            .unwrap();
        store
            .transaction(|tx| {
                let member = tx.member(&id)?;
                tx.assign_locker(&member, 2)
            })
            .unwrap();

        let first = store.read(|tx| tx.locker(1)).unwrap();
        let second = store.read(|tx| tx.locker(2)).unwrap();
        assert!(first.available);
        assert_eq!(second.member_id.as_ref(), Some(&id));
        assert_eq!(store.read(|tx| tx.member(&id)).unwrap().locker_no, Some(2));
    }

    #[test]
    fn test_assign_taken_locker_fails() {
        let (store, first) = store_with_member("MEM-000001");
        let second = MemberId::new("MEM-000002").unwrap();
        let form = NewMember { name: "Bo".into(), ..NewMember::default() };
        store
            .transaction(|tx| {
                tx.insert_member(&second, &form, chrono::Utc::now())?;
                let member = tx.member(&first)?;
                tx.assign_locker(&member, 1)
            })
            .unwrap();

        let result = store.transaction(|tx| {
            let member = tx.member(&second)?;
            tx.assign_locker(&member, 1)
        });
        assert!(matches!(result, Err(AdminError::LockerUnavailable(1))));
    }

    #[test]
    fn test_unknown_locker() {
        let (store, _) = store_with_member("MEM-000001");
        assert!(matches!(store.read(|tx| tx.locker(99)), Err(AdminError::LockerNotFound(99))));
    }

    #[test]
    fn test_soft_delete_releases_locker() {
        let (store, id) = store_with_member("MEM-000001");
        store
            .transaction(|tx| {
                let member = tx.member(&id)?;
                tx.assign_locker(&member, 3)?;
                tx.soft_delete_member(&id, chrono::Utc::now())
            })
            .unwrap();
        assert!(store.read(|tx| tx.locker(3)).unwrap().available);
    }
}

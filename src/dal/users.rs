//! User and cohort operations

use serde_json::{json, Map, Value};

use super::{DalError, DalResult, DataAccess};
use crate::model::{
    from_snapshot, to_document, Cohort, User, UserLookup, COHORT_COLLECTION, USER_COLLECTION,
};
use crate::store::{FilterExpr, Query};

impl DataAccess {
    /// Create or overwrite the user stored under `id`
    pub fn create_user(&self, id: &str, user: &User) -> DalResult<()> {
        if id.is_empty() {
            return Err(DalError::invalid_input("user id is empty"));
        }
        self.store.set(USER_COLLECTION, id, to_document(user)?)?;
        Ok(())
    }

    /// Merge `patch` into an existing user and return the result
    pub fn update_user(&self, id: &str, patch: Map<String, Value>) -> DalResult<User> {
        let mut patch = patch;
        patch.remove("id");

        self.run_transaction("update_user", |txn| {
            txn.update(USER_COLLECTION, id, patch.clone())?;
            match txn.get(USER_COLLECTION, id)? {
                Some(snapshot) => Ok(from_snapshot(snapshot)?),
                None => Err(DalError::not_found("user", id)),
            }
        })
    }

    /// Every user not flagged `disabled`
    pub fn find_all_users(&self) -> DalResult<Vec<User>> {
        let users = self.query_users(&Query::collection(USER_COLLECTION))?;
        Ok(users.into_iter().filter(|user| !user.disabled).collect())
    }

    pub fn find_user_by_address(&self, address: &str) -> DalResult<UserLookup> {
        match self.store.get(USER_COLLECTION, address)? {
            Some(snapshot) => Ok(UserLookup::found(from_snapshot(snapshot)?)),
            None => Ok(UserLookup::missing()),
        }
    }

    pub fn find_all_cohorts(&self) -> DalResult<Vec<Cohort>> {
        self.store
            .query(&Query::collection(COHORT_COLLECTION))?
            .into_iter()
            .map(|snapshot| from_snapshot(snapshot).map_err(DalError::from))
            .collect()
    }

    /// Users whose `ensClaimData.provided` is exactly `false`
    pub fn get_builders_with_pending_ens_claims(&self) -> DalResult<Vec<User>> {
        let query = Query::collection(USER_COLLECTION)
            .filter(FilterExpr::eq("ensClaimData.provided", json!(false)));
        self.query_users(&query)
    }

    fn query_users(&self, query: &Query) -> DalResult<Vec<User>> {
        self.store
            .query(query)?
            .into_iter()
            .map(|snapshot| from_snapshot(snapshot).map_err(DalError::from))
            .collect()
    }
}

//! Site configuration stored per category in the `config` collection

use super::{DalError, DalResult, DataAccess};
use crate::model::{ConfigData, CONFIG_COLLECTION};

impl DataAccess {
    /// Config values for `category`, `None` when the category is unset
    pub fn get_config_data(&self, category: &str) -> DalResult<Option<ConfigData>> {
        Ok(self
            .store
            .get(CONFIG_COLLECTION, category)?
            .map(|snapshot| snapshot.data))
    }

    /// Merge `patch` into an existing category and return the result
    pub fn set_config_data(&self, category: &str, patch: ConfigData) -> DalResult<ConfigData> {
        self.run_transaction("set_config_data", |txn| {
            txn.update(CONFIG_COLLECTION, category, patch.clone())?;
            match txn.get(CONFIG_COLLECTION, category)? {
                Some(snapshot) => Ok(snapshot.data),
                None => Err(DalError::not_found("config", category)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    fn dal() -> DataAccess {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                CONFIG_COLLECTION,
                "general",
                json!({"maintenance": false, "banner": "hello"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap();
        DataAccess::new(store)
    }

    #[test]
    fn test_get_known_and_unknown_category() {
        let dal = dal();
        let general = dal.get_config_data("general").unwrap().unwrap();
        assert_eq!(general["banner"], json!("hello"));
        assert!(dal.get_config_data("missing").unwrap().is_none());
    }

    #[test]
    fn test_set_merges() {
        let dal = dal();
        let patch = json!({"maintenance": true}).as_object().cloned().unwrap();

        let data = dal.set_config_data("general", patch).unwrap();
        assert_eq!(data["maintenance"], json!(true));
        assert_eq!(data["banner"], json!("hello"));
    }

    #[test]
    fn test_set_on_missing_category() {
        let err = dal()
            .set_config_data("missing", ConfigData::new())
            .unwrap_err();
        assert_eq!(err.code(), "BUIDL_STORE_NOT_FOUND");
    }
}

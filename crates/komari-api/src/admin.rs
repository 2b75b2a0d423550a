// Admin client management
//
// Edit, remove and reorder monitored clients. Each endpoint answers with
// the standard envelope and requires an admin session or API key.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::client::KomariClient;
use crate::error::Error;

#[derive(Serialize)]
struct OrderRequest<'a> {
    uuids: &'a [String],
}

impl KomariClient {
    /// Apply a JSON object of field changes to one client.
    pub async fn edit_client(&self, uuid: &str, changes: &Value) -> Result<(), Error> {
        let url = self.api_url(&format!("/api/admin/client/{uuid}/edit"))?;
        debug!(uuid, "editing client");
        self.post_envelope::<Value>(url, Some(changes), "Edit client failed")
            .await?;
        Ok(())
    }

    /// Delete one client and its history.
    pub async fn remove_client(&self, uuid: &str) -> Result<(), Error> {
        let url = self.api_url(&format!("/api/admin/client/{uuid}/remove"))?;
        debug!(uuid, "removing client");
        self.post_envelope::<Value>(url, None::<&Value>, "Remove client failed")
            .await?;
        Ok(())
    }

    /// Persist a new display order for the given client uuids.
    pub async fn reorder_clients(&self, uuids: &[String]) -> Result<(), Error> {
        let url = self.api_url("/api/admin/client/order")?;
        debug!(count = uuids.len(), "reordering clients");
        self.post_envelope::<Value>(url, Some(&OrderRequest { uuids }), "Reorder clients failed")
            .await?;
        Ok(())
    }
}

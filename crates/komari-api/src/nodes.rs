// Node inventory and live status over JSON-RPC.

use std::collections::HashMap;

use crate::client::KomariClient;
use crate::error::Error;
use crate::models::{NodeData, NodeStatusData};

pub const METHOD_GET_NODES: &str = "common:getNodes";
pub const METHOD_GET_NODES_LATEST_STATUS: &str = "common:getNodesLatestStatus";

impl KomariClient {
    /// Full node inventory, keyed by node uuid.
    pub async fn get_nodes(&self) -> Result<HashMap<String, NodeData>, Error> {
        self.call(METHOD_GET_NODES).await
    }

    /// Latest status of every node, keyed by node uuid.
    pub async fn get_nodes_latest_status(&self) -> Result<HashMap<String, NodeStatusData>, Error> {
        self.call(METHOD_GET_NODES_LATEST_STATUS).await
    }
}

//! Add workflow - prepare, allocate, and release on failure
//!
//! A successful prepare leaves the coordinator holding a write lease on
//! the new file and a lock on its directory. Any failure after that point
//! must hand both back before the error is reported.

use crate::mediator::{Mediator, MediatorError};
use crate::models::{
    AllocateNodesReply, AllocateNodesRequest, PrepareAddRequest, ReleaseLeaseRequest,
    UnlockDirectoryRequest,
};

/// Storage placement for one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlacement {
    pub index: u32,
    pub nodes: AllocateNodesReply,
}

/// A prepared add with every chunk placed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPlan {
    pub file_node_id: String,
    pub chunks: Vec<ChunkPlacement>,
}

/// Outcome of handing an add reservation back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Released {
    pub lease: bool,
    pub directory: bool,
}

/// Prepare an add and allocate storage nodes for each of its chunks.
///
/// If prepare fails nothing is held and no allocation is attempted. If an
/// allocation fails the reservation is released and the allocation error
/// is returned.
pub async fn plan_add(
    mediator: &Mediator,
    request: &PrepareAddRequest,
) -> Result<AddPlan, MediatorError> {
    let prepared = mediator.check_and_prepare_add(request).await?;
    let file_node_id = prepared.file_node_id;

    // chunk_num comes from the coordinator; grow as placements arrive
    let mut chunks = Vec::new();
    for index in 0..prepared.chunk_num {
        let allocate = AllocateNodesRequest {
            file_node_id: file_node_id.clone(),
            chunk_index: index,
        };

        match mediator.allocate_nodes_for_add(&allocate).await {
            Ok(nodes) => chunks.push(ChunkPlacement { index, nodes }),
            Err(err) => {
                if let Err(release_err) = release(mediator, &file_node_id).await {
                    tracing::warn!(
                        file_node_id = %file_node_id,
                        error = %release_err,
                        "failed to release add reservation"
                    );
                }
                return Err(err);
            }
        }
    }

    Ok(AddPlan {
        file_node_id,
        chunks,
    })
}

/// Release the write lease, then unlock the directory.
///
/// Both calls are always attempted; the first error wins.
pub async fn release(mediator: &Mediator, file_node_id: &str) -> Result<Released, MediatorError> {
    let lease = mediator
        .release_lease_for_add(&ReleaseLeaseRequest {
            file_node_id: file_node_id.to_string(),
        })
        .await;

    let directory = mediator
        .unlock_directory_for_add(&UnlockDirectoryRequest {
            file_node_id: file_node_id.to_string(),
        })
        .await;

    Ok(Released {
        lease: lease?.success,
        directory: directory?.success,
    })
}

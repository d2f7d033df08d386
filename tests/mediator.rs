mod common;

use serde_json::json;
use std::sync::{Arc, Mutex};

use common::{cut_off, fail, ok, unreachable_endpoint, CoordinatorStub};
use dfs_client::mediator::{routes, EndpointResolver, FixedEndpoint};
use dfs_client::models::{
    AllocateNodesRequest, ListRequest, PrepareAddRequest, ReleaseLeaseRequest, StatRequest,
    UnlockDirectoryRequest,
};
use dfs_client::{Mediator, MediatorError};

fn mediator_for(stub: &CoordinatorStub) -> Mediator {
    Mediator::with_resolver(FixedEndpoint::new(stub.endpoint()))
}

fn prepare_request() -> PrepareAddRequest {
    PrepareAddRequest {
        path: "/docs".to_string(),
        file_name: "report.txt".to_string(),
        size: 42,
    }
}

#[tokio::test]
async fn prepare_add_issues_one_call() {
    let stub = CoordinatorStub::start(vec![ok(
        routes::CHECK_ARGS_FOR_ADD,
        json!({ "fileNodeId": "fn-1", "chunkNum": 3 }),
    )])
    .await;

    let reply = mediator_for(&stub)
        .check_and_prepare_add(&prepare_request())
        .await
        .unwrap();

    assert_eq!(reply.file_node_id, "fn-1");
    assert_eq!(reply.chunk_num, 3);

    let calls = stub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/MasterAddService/CheckArgs4Add");
    assert_eq!(
        calls[0].body,
        json!({ "path": "/docs", "fileName": "report.txt", "size": 42 })
    );
}

#[tokio::test]
async fn stat_and_list_send_read_mode() {
    let stub = CoordinatorStub::start(vec![
        ok(
            routes::CHECK_AND_STAT,
            json!({ "fileName": "a", "isDirectory": false, "size": 7, "modTime": 100 }),
        ),
        ok(
            routes::CHECK_AND_LIST,
            json!({ "files": [
                { "fileName": "a", "isDirectory": false, "size": 7, "modTime": 100 },
                { "fileName": "sub", "isDirectory": true }
            ] }),
        ),
    ])
    .await;
    let mediator = mediator_for(&stub);

    let stat = mediator
        .check_and_stat(&StatRequest {
            path: "/a".to_string(),
            is_latest: true,
        })
        .await
        .unwrap();
    assert_eq!(stat.size, 7);
    assert_eq!(stat.mod_time, 100);

    let list = mediator
        .check_and_list(&ListRequest {
            path: "/".to_string(),
            is_latest: false,
        })
        .await
        .unwrap();
    assert_eq!(list.files.len(), 2);
    assert!(list.files[1].is_directory);

    let calls = stub.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].body, json!({ "path": "/a", "isLatest": true }));
    assert_eq!(calls[1].path, "/MasterListService/CheckAndList");
    assert_eq!(calls[1].body, json!({ "path": "/", "isLatest": false }));
}

#[tokio::test]
async fn allocation_and_cleanup_calls() {
    let stub = CoordinatorStub::start(vec![
        ok(
            routes::GET_DATA_NODES_FOR_ADD,
            json!({ "dataNodeIds": ["dn1", "dn2"], "dataNodeAdrs": ["10.0.0.1:9001", "10.0.0.2:9001"] }),
        ),
        ok(routes::UNLOCK_DIRECTORY_FOR_ADD, json!({ "success": true })),
        ok(routes::RELEASE_LEASE_FOR_ADD, json!({ "success": true })),
    ])
    .await;
    let mediator = mediator_for(&stub);

    let nodes = mediator
        .allocate_nodes_for_add(&AllocateNodesRequest {
            file_node_id: "fn-1".to_string(),
            chunk_index: 0,
        })
        .await
        .unwrap();
    assert_eq!(
        nodes.nodes().collect::<Vec<_>>(),
        [("dn1", "10.0.0.1:9001"), ("dn2", "10.0.0.2:9001")]
    );

    let unlocked = mediator
        .unlock_directory_for_add(&UnlockDirectoryRequest {
            file_node_id: "fn-1".to_string(),
        })
        .await
        .unwrap();
    assert!(unlocked.success);

    let released = mediator
        .release_lease_for_add(&ReleaseLeaseRequest {
            file_node_id: "fn-1".to_string(),
        })
        .await
        .unwrap();
    assert!(released.success);

    assert_eq!(
        stub.paths(),
        [
            "/MasterAddService/GetDataNodes4Add",
            "/MasterAddService/UnlockDic4Add",
            "/MasterAddService/ReleaseLease4Add",
        ]
    );
    assert_eq!(stub.calls()[0].body, json!({ "fileNodeId": "fn-1", "chunkIndex": 0 }));
}

#[tokio::test]
async fn rejection_is_returned_verbatim() {
    let stub = CoordinatorStub::start(vec![fail(
        routes::CHECK_ARGS_FOR_ADD,
        409,
        "path /docs/report.txt already exists\n",
    )])
    .await;

    let err = mediator_for(&stub)
        .check_and_prepare_add(&prepare_request())
        .await
        .unwrap_err();

    match err {
        MediatorError::Rejected {
            method,
            status,
            message,
        } => {
            assert_eq!(method, "CheckArgs4Add");
            assert_eq!(status, 409);
            assert_eq!(message, "path /docs/report.txt already exists");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(stub.calls().len(), 1);
}

#[tokio::test]
async fn rejection_with_truncated_body_keeps_status() {
    let stub = CoordinatorStub::start(vec![cut_off(
        routes::CHECK_AND_STAT,
        500,
        "stat table is",
    )])
    .await;

    let err = mediator_for(&stub)
        .check_and_stat(&StatRequest {
            path: "/docs".to_string(),
            is_latest: false,
        })
        .await
        .unwrap_err();

    match err {
        MediatorError::Rejected {
            method,
            status,
            message,
        } => {
            assert_eq!(method, "CheckAndStat");
            assert_eq!(status, 500);
            assert!(message.starts_with("<unreadable body: "), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_reply_is_an_error() {
    let stub = CoordinatorStub::start(vec![ok(routes::CHECK_AND_STAT, json!("not a reply"))]).await;

    let err = mediator_for(&stub)
        .check_and_stat(&StatRequest {
            path: "/a".to_string(),
            is_latest: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, MediatorError::Decode { method: "CheckAndStat", .. }));
}

#[tokio::test]
async fn unreachable_coordinator_is_a_connect_error() {
    let mediator = Mediator::with_resolver(FixedEndpoint::new(unreachable_endpoint()));

    let err = mediator
        .check_and_prepare_add(&prepare_request())
        .await
        .unwrap_err();

    assert!(matches!(err, MediatorError::Connect { .. }), "{err}");
}

#[tokio::test]
async fn empty_endpoint_fails_the_call() {
    let mediator = Mediator::with_resolver(FixedEndpoint::new(""));

    let result = mediator
        .release_lease_for_add(&ReleaseLeaseRequest {
            file_node_id: "fn-1".to_string(),
        })
        .await;

    assert!(result.is_err());
}

struct Switchable(Arc<Mutex<String>>);

impl EndpointResolver for Switchable {
    fn resolve(&self) -> Result<String, MediatorError> {
        Ok(self.0.lock().unwrap().clone())
    }
}

#[tokio::test]
async fn endpoint_is_resolved_on_every_call() {
    let reply = json!({ "success": true });
    let first = CoordinatorStub::start(vec![ok(routes::UNLOCK_DIRECTORY_FOR_ADD, reply.clone())]).await;
    let second = CoordinatorStub::start(vec![ok(routes::UNLOCK_DIRECTORY_FOR_ADD, reply)]).await;

    let endpoint = Arc::new(Mutex::new(first.endpoint()));
    let mediator = Mediator::with_resolver(Switchable(endpoint.clone()));
    let request = UnlockDirectoryRequest {
        file_node_id: "fn-1".to_string(),
    };

    mediator.unlock_directory_for_add(&request).await.unwrap();
    *endpoint.lock().unwrap() = second.endpoint();
    mediator.unlock_directory_for_add(&request).await.unwrap();

    assert_eq!(first.calls().len(), 1);
    assert_eq!(second.calls().len(), 1);
}

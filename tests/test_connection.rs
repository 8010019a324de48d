use std::time::Duration;

use futures::future::join_all;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mongo::Mongo;

use lms::db::connection::MongoConnection;

#[tokio::test]
async fn concurrent_first_use_shares_one_handle() {
    let container = Mongo::default()
        .start()
        .await
        .expect("Failed to start MongoDB container");
    let port = container
        .get_host_port_ipv4(27017)
        .await
        .expect("Failed to get MongoDB port");

    let connection = MongoConnection::new(
        format!("mongodb://127.0.0.1:{port}"),
        "lms_connection_test",
        Duration::from_secs(10),
    );
    assert!(!connection.is_connected());

    let handles = join_all((0..16).map(|_| connection.database())).await;
    let first = handles[0].as_ref().expect("first caller connects");
    for handle in &handles {
        let handle = handle.as_ref().expect("every caller gets the handle");
        assert!(std::ptr::eq(*handle, *first));
    }
    assert!(connection.is_connected());

    let again = connection.database().await.unwrap();
    assert!(std::ptr::eq(again, *first));
}

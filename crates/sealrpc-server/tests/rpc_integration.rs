// ============================================
// File: crates/sealrpc-server/tests/rpc_integration.rs
// ============================================
//! End-to-end tests: real TLS over loopback between `RpcServer` and
//! `RpcClient`, with certificates generated per test.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::task::JoinHandle;

use sealrpc_client::{ClientConfig, ClientError, ClientOptions, RpcClient};
use sealrpc_core::{CoreError, ServerIdentity, TrustAnchors};
use sealrpc_server::handlers::builtin::{AddReply, CALC_ADD, DIAGNOSTICS_ECHO};
use sealrpc_server::{register_builtin, RpcServer, ServerConfig, ServerError};

const WAIT: Duration = Duration::from_secs(5);

// ============================================
// Fixtures
// ============================================

struct Pki {
    cert_pem: String,
    key_pem: String,
}

impl Pki {
    fn generate() -> Self {
        let cert = rcgen::generate_simple_self_signed(vec![
            "localhost".to_string(),
            "127.0.0.1".to_string(),
        ])
        .unwrap();
        Self {
            cert_pem: cert.cert.pem(),
            key_pem: cert.key_pair.serialize_pem(),
        }
    }

    fn identity(&self) -> ServerIdentity {
        ServerIdentity::from_pem(self.cert_pem.as_bytes(), self.key_pem.as_bytes()).unwrap()
    }

    fn trust(&self) -> TrustAnchors {
        TrustAnchors::from_pem(self.cert_pem.as_bytes()).unwrap()
    }
}

struct Running {
    server: Arc<RpcServer>,
    serving: JoinHandle<sealrpc_server::Result<()>>,
    pki: Pki,
}

impl Running {
    fn address(&self) -> String {
        self.server.local_addr().to_string()
    }

    async fn client(&self, name: &str) -> RpcClient {
        RpcClient::connect_with(
            &self.pki.trust(),
            &self.address(),
            ClientOptions::new(name).with_server_name("localhost"),
        )
        .await
        .unwrap()
    }
}

async fn start_server(setup: impl FnOnce(&RpcServer)) -> Running {
    let pki = Pki::generate();
    let server = RpcServer::start(&pki.identity(), "127.0.0.1:0").await.unwrap();
    setup(&server);

    let server = Arc::new(server);
    let serving = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.serve().await })
    };

    Running {
        server,
        serving,
        pki,
    }
}

fn echo(args: Bytes) -> anyhow::Result<Vec<u8>> {
    Ok(args.to_vec())
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

// ============================================
// Calls
// ============================================

#[tokio::test]
async fn test_calc_add_over_tls() {
    let running = start_server(|s| register_builtin(s.registry()).unwrap()).await;
    let client = running.client("calc").await;

    let reply = client.call(CALC_ADD, &br#"{"A":5,"B":3}"#[..]).await.unwrap();
    let reply: AddReply = serde_json::from_slice(&reply).unwrap();
    assert_eq!(reply.sum, 8);

    client.close();
}

#[tokio::test]
async fn test_registered_handler_bytes_returned_exactly() {
    let running = start_server(|s| {
        s.register_method("Blob.Reverse", |args: Bytes| {
            let mut out = args.to_vec();
            out.reverse();
            Ok(out)
        })
        .unwrap();
        s.register_method("Blob.Empty", |_args: Bytes| Ok(Vec::new()))
            .unwrap();
    })
    .await;
    let client = running.client("blob").await;

    let payload: Vec<u8> = (0..=255u8).collect();
    let reply = client.call("Blob.Reverse", payload.clone()).await.unwrap();
    let mut expected = payload;
    expected.reverse();
    assert_eq!(&reply[..], &expected[..]);

    let reply = client.call("Blob.Empty", &b"ignored"[..]).await.unwrap();
    assert!(reply.is_empty());
}

#[tokio::test]
async fn test_echo_builtin_with_large_payload() {
    let running = start_server(|s| register_builtin(s.registry()).unwrap()).await;
    let client = running.client("echo").await;

    let payload = vec![0xA5u8; 1 << 20];
    let reply = client.call(DIAGNOSTICS_ECHO, payload.clone()).await.unwrap();
    assert_eq!(reply.len(), payload.len());
    assert_eq!(&reply[..], &payload[..]);
}

#[tokio::test]
async fn test_unregistered_method_is_remote_error_and_connection_survives() {
    let running = start_server(|s| s.register_method("Diagnostics.Echo", echo).unwrap()).await;
    let client = running.client("missing").await;

    let err = client.call("Calc.Missing", Bytes::new()).await.unwrap_err();
    assert!(err.is_remote());
    assert!(err.remote_message().unwrap().contains("Calc.Missing"));

    let reply = client.call("Diagnostics.Echo", &b"ok"[..]).await.unwrap();
    assert_eq!(&reply[..], b"ok");
}

#[tokio::test]
async fn test_ill_formed_method_names_answered_by_server() {
    let running = start_server(|s| s.register_method("Diagnostics.Echo", echo).unwrap()).await;
    let client = running.client("ill-formed").await;

    for name in ["Add", "Calc.Add.More", "calc add"] {
        let err = client.call(name, Bytes::new()).await.unwrap_err();
        assert!(err.is_remote(), "{name:?} gave {err:?}");
        assert_eq!(
            err.remote_message(),
            Some(format!("rpc: can't find method {name}").as_str())
        );
    }

    let reply = client.call("Diagnostics.Echo", &b"still open"[..]).await.unwrap();
    assert_eq!(&reply[..], b"still open");
}

#[tokio::test]
async fn test_servers_in_one_process_keep_separate_registries() {
    let first = start_server(|s| {
        s.register_method("First.Only", |_args: Bytes| Ok(b"first".to_vec()))
            .unwrap();
    })
    .await;
    let second = start_server(|s| {
        s.register_method("Second.Only", |_args: Bytes| Ok(b"second".to_vec()))
            .unwrap();
    })
    .await;
    assert_ne!(first.server.local_addr(), second.server.local_addr());

    let to_first = first.client("to-first").await;
    let to_second = second.client("to-second").await;

    assert_eq!(&to_first.call("First.Only", Bytes::new()).await.unwrap()[..], b"first");
    assert_eq!(&to_second.call("Second.Only", Bytes::new()).await.unwrap()[..], b"second");

    assert!(to_first.call("Second.Only", Bytes::new()).await.unwrap_err().is_remote());
    assert!(to_second.call("First.Only", Bytes::new()).await.unwrap_err().is_remote());

    assert!(!first.server.registry().contains("Second.Only"));
    assert!(!second.server.registry().contains("First.Only"));
}

#[tokio::test]
async fn test_handler_error_becomes_remote_error() {
    let running = start_server(|s| {
        s.register_method("Calc.Div", |_args: Bytes| anyhow::bail!("division by zero"))
            .unwrap();
    })
    .await;
    let client = running.client("div").await;

    let err = client.call("Calc.Div", Bytes::new()).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Remote { ref method, ref message }
            if method == "Calc.Div" && message == "division by zero"
    ));
}

#[tokio::test]
async fn test_handler_panic_is_contained() {
    let running = start_server(|s| {
        s.register_method("Fault.Panic", |_args: Bytes| -> anyhow::Result<Vec<u8>> {
            panic!("boom")
        })
        .unwrap();
        s.register_method("Diagnostics.Echo", echo).unwrap();
    })
    .await;

    let client = running.client("faulty").await;
    let err = client.call("Fault.Panic", Bytes::new()).await.unwrap_err();
    let message = err.remote_message().unwrap();
    assert!(message.starts_with("handler fault"), "got {message:?}");
    assert!(message.contains("boom"));

    // Same connection keeps working
    let reply = client.call("Diagnostics.Echo", &b"after"[..]).await.unwrap();
    assert_eq!(&reply[..], b"after");

    // And so does a new one
    let fresh = running.client("fresh").await;
    let reply = fresh.call("Diagnostics.Echo", &b"new"[..]).await.unwrap();
    assert_eq!(&reply[..], b"new");
}

#[tokio::test]
async fn test_concurrent_calls_matched_to_own_responses() {
    let running = start_server(|s| s.register_method("Diagnostics.Echo", echo).unwrap()).await;
    let client = Arc::new(running.client("parallel").await);

    let mut calls = Vec::new();
    for i in 0..64u32 {
        let client = Arc::clone(&client);
        calls.push(tokio::spawn(async move {
            let payload = format!("call-{i}");
            let reply = client
                .call("Diagnostics.Echo", payload.clone().into_bytes())
                .await
                .unwrap();
            assert_eq!(&reply[..], payload.as_bytes());
        }));
    }

    for call in calls {
        tokio::time::timeout(WAIT, call).await.unwrap().unwrap();
    }
    assert_eq!(client.pending_calls(), 0);
}

// ============================================
// Registration
// ============================================

#[tokio::test]
async fn test_duplicate_and_invalid_registration_rejected() {
    let pki = Pki::generate();
    let server = RpcServer::start(&pki.identity(), "127.0.0.1:0").await.unwrap();

    server.register_method("Calc.Add", echo).unwrap();
    let err = server.register_method("Calc.Add", echo).unwrap_err();
    assert!(matches!(err, ServerError::DuplicateMethod { .. }));

    for bad in ["", "Calc", "Calc.", ".Add", "Calc.Add.Extra"] {
        let err = server.register_method(bad, echo).unwrap_err();
        assert!(err.is_registration_error(), "accepted {bad:?}");
    }
    assert_eq!(server.registry().len(), 1);
}

// ============================================
// Dialing
// ============================================

#[tokio::test]
async fn test_untrusted_server_fails_dial() {
    let running = start_server(|s| s.register_method("Diagnostics.Echo", echo).unwrap()).await;
    let other = Pki::generate();

    let err = RpcClient::connect_with(
        &other.trust(),
        &running.address(),
        ClientOptions::new("stranger").with_server_name("localhost"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ClientError::Dial { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_wrong_server_name_fails_dial() {
    let running = start_server(|_| {}).await;

    let err = RpcClient::connect_with(
        &running.pki.trust(),
        &running.address(),
        ClientOptions::new("misnamed").with_server_name("rpc.example.com"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ClientError::Dial { .. }));
}

#[tokio::test]
async fn test_server_name_from_address_host() {
    let running = start_server(|s| s.register_method("Diagnostics.Echo", echo).unwrap()).await;

    // 127.0.0.1 is in the certificate's SANs
    let client = RpcClient::connect(&running.pki.trust(), &running.address(), "by-ip")
        .await
        .unwrap();
    let reply = client.call("Diagnostics.Echo", &b"ip"[..]).await.unwrap();
    assert_eq!(&reply[..], b"ip");
}

#[tokio::test]
async fn test_dial_without_listener_fails_fast() {
    let pki = Pki::generate();
    let address = format!("127.0.0.1:{}", free_port());

    let result = tokio::time::timeout(
        WAIT,
        RpcClient::connect(&pki.trust(), &address, "nobody-home"),
    )
    .await
    .unwrap();
    assert!(matches!(result, Err(ClientError::Dial { .. })));
}

// ============================================
// Lifecycle
// ============================================

#[tokio::test]
async fn test_close_ends_serve_but_open_connection_keeps_serving() {
    let running = start_server(|s| s.register_method("Diagnostics.Echo", echo).unwrap()).await;
    let client = running.client("survivor").await;
    client.call("Diagnostics.Echo", &b"before"[..]).await.unwrap();

    running.server.close();
    running.server.close();

    let served = tokio::time::timeout(WAIT, running.serving).await.unwrap().unwrap();
    assert!(served.is_ok());
    assert!(running.server.is_closed());

    let reply = client.call("Diagnostics.Echo", &b"after"[..]).await.unwrap();
    assert_eq!(&reply[..], b"after");
    assert_eq!(running.server.active_connections(), 1);

    // No new connections once closed
    let err = RpcClient::connect_with(
        &running.pki.trust(),
        &running.server.local_addr().to_string(),
        ClientOptions::new("late").with_server_name("localhost"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ClientError::Dial { .. }));
}

#[tokio::test]
async fn test_client_close_unblocks_pending_call() {
    let running = start_server(|s| {
        s.register_method("Slow.Sleep", |_args: Bytes| {
            std::thread::sleep(Duration::from_secs(2));
            Ok(Vec::new())
        })
        .unwrap();
    })
    .await;
    let client = Arc::new(running.client("impatient").await);

    let blocked = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.call("Slow.Sleep", Bytes::new()).await })
    };
    while client.pending_calls() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    client.close();
    let result = tokio::time::timeout(Duration::from_millis(500), blocked)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(ClientError::Closed)));
}

#[tokio::test]
async fn test_connection_cap_drops_excess_connections() {
    let pki = Pki::generate();
    let server = RpcServer::start(&pki.identity(), "127.0.0.1:0")
        .await
        .unwrap()
        .with_max_connections(1);
    server.register_method("Diagnostics.Echo", echo).unwrap();
    let server = Arc::new(server);
    let _serving = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.serve().await })
    };

    let address = server.local_addr().to_string();
    let options = || ClientOptions::new("capped").with_server_name("localhost");

    let first = RpcClient::connect_with(&pki.trust(), &address, options())
        .await
        .unwrap();
    first.call("Diagnostics.Echo", Bytes::new()).await.unwrap();

    // The second TCP connection is accepted and then dropped before the TLS
    // handshake completes, so either connecting or the first call fails.
    let second = match RpcClient::connect_with(&pki.trust(), &address, options()).await {
        Ok(client) => client.call("Diagnostics.Echo", Bytes::new()).await.map(|_| ()),
        Err(e) => Err(e),
    };
    assert!(second.is_err());
    assert_eq!(server.active_connections(), 1);
}

// ============================================
// Configuration
// ============================================

#[tokio::test]
async fn test_server_and_client_from_config_files() {
    let pki = Pki::generate();
    let dir = tempfile::tempdir().unwrap();
    let cert = write_file(&dir, "server.crt", &pki.cert_pem);
    let key = write_file(&dir, "server.key", &pki.key_pem);
    let port = free_port();

    let server_config = ServerConfig::from_str(&format!(
        "[network]\nlisten_addr = \"127.0.0.1:{port}\"\n\n\
         [tls]\ncert_file = {cert:?}\nkey_file = {key:?}\n\n\
         [limits]\nmax_connections = 8\n",
    ))
    .unwrap();

    let server = Arc::new(RpcServer::from_config(&server_config).await.unwrap());
    register_builtin(server.registry()).unwrap();
    let serving = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.serve().await })
    };

    let client_config = ClientConfig::from_str(&format!(
        "[server]\naddress = \"127.0.0.1:{port}\"\nserver_name = \"localhost\"\n\n\
         [tls]\ntrust_file = {cert:?}\n\n\
         [client]\ndisplay_name = \"configured\"\n",
    ))
    .unwrap();

    let client = RpcClient::from_config(&client_config).await.unwrap();
    assert_eq!(client.display_name(), "configured");
    let reply = client.call(CALC_ADD, &br#"{"A":-2,"B":10}"#[..]).await.unwrap();
    assert_eq!(&reply[..], br#"{"Sum":8}"#);

    client.close();
    server.close();
    assert!(tokio::time::timeout(WAIT, serving).await.unwrap().unwrap().is_ok());
}

#[tokio::test]
async fn test_from_config_with_bad_credentials_is_fatal() {
    let pki = Pki::generate();
    let other = Pki::generate();
    let dir = tempfile::tempdir().unwrap();
    let cert = write_file(&dir, "server.crt", &pki.cert_pem);
    let key = write_file(&dir, "other.key", &other.key_pem);

    let mut config = ServerConfig::default();
    config.network.listen_addr = format!("127.0.0.1:{}", free_port()).parse().unwrap();
    config.tls.cert_file = cert;
    config.tls.key_file = key;

    let err = RpcServer::from_config(&config).await.unwrap_err();
    assert!(matches!(err, ServerError::Core(CoreError::KeyMismatch { .. })), "got {err:?}");
    assert!(err.is_fatal());

    config.tls.key_file = dir.path().join("missing.key");
    let err = RpcServer::from_config(&config).await.unwrap_err();
    assert!(err.is_config_error());
}

#[tokio::test]
async fn test_client_from_config_with_empty_trust_file() {
    let dir = tempfile::tempdir().unwrap();
    let trust = write_file(&dir, "ca.pem", "");

    let mut config = ClientConfig::default();
    config.tls.trust_file = trust;

    let err = RpcClient::from_config(&config).await.unwrap_err();
    assert!(err.is_config_error());
    assert!(matches!(err, ClientError::Core(CoreError::EmptyTrustPool { .. })));
}

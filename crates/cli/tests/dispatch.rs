use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use eztz_cli::Services;
use eztz_cli::console::Console;
use eztz_cli::failure::CONNECTION_MESSAGE;
use eztz_cli::modules::settings::Settings;
use tezos_rpc::{
    ForgedOperation, KeyError, KeyService, Keys, Mutez, NodeProvider, OperationContent,
    OperationObject, RpcError, Signed, TezosNode, TransactionDescriptor, Watermark,
};

const NODE: &str = "http://127.0.0.1:8732";
const SECRET: &str = "edskMockSecret";

#[derive(Debug, Clone)]
enum Behavior {
    Resolve,
    Delay(Duration),
    RejectEmpty,
}

#[derive(Debug, Default)]
struct Calls {
    provide: Cell<usize>,
    transfer: Cell<usize>,
    send_operation: Cell<usize>,
    inject: Cell<usize>,
    last_batch: RefCell<Vec<TransactionDescriptor>>,
}

impl Calls {
    fn network(&self) -> usize {
        self.transfer.get() + self.send_operation.get() + self.inject.get()
    }
}

struct MockProvider {
    calls: Rc<Calls>,
    behavior: Behavior,
}

struct MockNode {
    calls: Rc<Calls>,
    behavior: Behavior,
}

impl MockNode {
    async fn settle(&self) -> Result<(), RpcError> {
        match &self.behavior {
            Behavior::Resolve => Ok(()),
            Behavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
            Behavior::RejectEmpty => Err(RpcError::Rejected {
                status: 502,
                url: format!("{NODE}/chains/main/blocks/head/header"),
                message: String::new(),
            }),
        }
    }
}

impl NodeProvider for MockProvider {
    type Node = MockNode;

    fn provide(&self, _uri: &str) -> Result<Self::Node, RpcError> {
        self.calls.provide.set(self.calls.provide.get() + 1);
        Ok(MockNode {
            calls: Rc::clone(&self.calls),
            behavior: self.behavior.clone(),
        })
    }
}

impl TezosNode for MockNode {
    async fn transfer(
        &self,
        _from: &str,
        _keys: &Keys,
        _to: &str,
        _amount: Mutez,
        _fee: Mutez,
    ) -> Result<String, RpcError> {
        self.calls.transfer.set(self.calls.transfer.get() + 1);
        self.settle().await?;
        Ok("op123".to_string())
    }

    async fn send_operation(
        &self,
        from: &str,
        operations: &[TransactionDescriptor],
        _keys: &Keys,
    ) -> Result<ForgedOperation, RpcError> {
        self.calls
            .send_operation
            .set(self.calls.send_operation.get() + 1);
        *self.calls.last_batch.borrow_mut() = operations.to_vec();
        self.settle().await?;

        let contents = operations
            .iter()
            .zip(1_u64..)
            .map(|(operation, counter)| OperationContent::transaction(from, operation, counter))
            .collect();

        Ok(ForgedOperation {
            opbytes: "beef".to_string(),
            op_ob: OperationObject {
                branch: "BLmock".to_string(),
                contents,
                protocol: Some("Pmock".to_string()),
                signature: None,
            },
        })
    }

    async fn inject(
        &self,
        _operation: &OperationObject,
        _signed_bytes: &str,
    ) -> Result<String, RpcError> {
        self.calls.inject.set(self.calls.inject.get() + 1);
        self.settle().await?;
        Ok("opInjected".to_string())
    }
}

/// Derives `tz1mock` for any key except `edskEmpty`, which derives an empty hash.
struct MockKeys;

impl KeyService for MockKeys {
    fn extract_keys(&self, secret: &str) -> Result<Keys, KeyError> {
        let pkh = if secret == "edskEmpty" { "" } else { "tz1mock" };
        Ok(Keys {
            sk: secret.to_string(),
            pk: "edpkmock".to_string(),
            pkh: pkh.to_string(),
        })
    }

    fn sign(&self, bytes: &str, _secret: &str, watermark: Watermark) -> Result<Signed, KeyError> {
        assert_eq!(watermark, Watermark::Generic);
        Ok(Signed {
            bytes: bytes.to_string(),
            sig: "ff".to_string(),
            edsig: "edsigmock".to_string(),
            sbytes: format!("{bytes}ff"),
        })
    }
}

struct Outcome {
    code: u8,
    out: String,
    err: String,
    calls: Rc<Calls>,
}

async fn run_with(behavior: Behavior, args: &[&str]) -> Outcome {
    let calls = Rc::new(Calls::default());
    let services = Services {
        settings: Settings::default(),
        provider: MockProvider {
            calls: Rc::clone(&calls),
            behavior,
        },
        keys: MockKeys,
    };

    let mut console = Console::new(Vec::new(), Vec::new());
    let argv = std::iter::once("eztz-simple").chain(args.iter().copied());
    let code = eztz_cli::run(argv, &services, &mut console).await;

    Outcome {
        code,
        out: String::from_utf8(console.out).expect("utf8 stdout"),
        err: String::from_utf8(console.err).expect("utf8 stderr"),
        calls,
    }
}

const TRANSFER_OPTIONS: [(&str, &str, &str); 5] = [
    ("-n", NODE, "No Tezos node provided."),
    ("-f", SECRET, "No sender SK provided."),
    ("-t", "tz1dest", "No receiver PKH provided."),
    ("-a", "1000", "No amount provided."),
    ("-p", "100", "No fee provided."),
];

const BATCH_OPTIONS: [(&str, &str, &str); 5] = [
    ("-n", NODE, "No Tezos node provided."),
    ("-f", SECRET, "No sender SK provided."),
    ("-r", "tz1a@10", "No recipients provided."),
    ("-p", "1420", "No fee provided."),
    ("-m", "5", "No timeout provided."),
];

const OPERATION_OBJECT: &str =
    r#"{"branch":"BLmock","contents":[],"protocol":"Pmock","signature":"edsigmock"}"#;

const INJECT_OPTIONS: [(&str, &str, &str); 3] = [
    ("-n", NODE, "No Tezos node provided."),
    ("-s", "beefff", "No signed operation bytes provided."),
    ("-o", OPERATION_OBJECT, "No operation object provided."),
];

/// Drops one option at a time and checks it is reported before any node is contacted.
async fn assert_each_missing_option_is_reported(command: &str, options: &[(&str, &str, &str)]) {
    for skipped in 0..options.len() {
        let mut args = vec![command];
        for (index, (flag, value, _)) in options.iter().enumerate() {
            if index != skipped {
                args.extend([*flag, *value]);
            }
        }

        let outcome = run_with(Behavior::Resolve, &args).await;
        let expected = options[skipped].2;

        assert_eq!(outcome.code, 1, "{command}: missing {expected}");
        assert!(outcome.err.contains(expected), "stderr: {}", outcome.err);
        assert!(outcome.out.is_empty(), "{command}: stdout: {}", outcome.out);
        assert_eq!(outcome.calls.provide.get(), 0);
        assert_eq!(outcome.calls.network(), 0);
    }
}

#[tokio::test]
async fn transfer_reports_each_missing_option_without_network() {
    assert_each_missing_option_is_reported("transfer", &TRANSFER_OPTIONS).await;
}

#[tokio::test]
async fn batch_reports_each_missing_option_without_network() {
    assert_each_missing_option_is_reported("forgeBatchTransfer", &BATCH_OPTIONS).await;
}

#[tokio::test]
async fn inject_reports_each_missing_option_without_network() {
    assert_each_missing_option_is_reported("inject", &INJECT_OPTIONS).await;
}

#[tokio::test]
async fn transfer_reports_only_first_missing_option() {
    let outcome = run_with(Behavior::Resolve, &["transfer", "-n", NODE]).await;

    assert_eq!(outcome.code, 1);
    assert!(outcome.err.contains("No sender SK provided."));
    assert!(!outcome.err.contains("No receiver PKH provided."));
    assert!(!outcome.err.contains("No fee provided."));
}

#[tokio::test]
async fn transfer_prints_operation_hash() {
    let outcome = run_with(
        Behavior::Resolve,
        &[
            "transfer", "-n", NODE, "-f", SECRET, "-t", "tz1dest", "-a", "1000", "-p", "100",
        ],
    )
    .await;

    assert_eq!(outcome.code, 0, "stderr: {}", outcome.err);
    assert!(outcome.out.contains("Using default timeout (5 seconds)."));
    assert!(
        outcome
            .out
            .lines()
            .any(|line| line == "Transfer successfully injected: op123")
    );
    assert_eq!(outcome.calls.transfer.get(), 1);
    assert!(outcome.err.is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_node_is_reported_as_timeout() {
    let outcome = run_with(
        Behavior::Delay(Duration::from_secs(30)),
        &[
            "transfer", "-n", NODE, "-f", SECRET, "-t", "tz1dest", "-a", "1000", "-p", "100",
            "-m", "2",
        ],
    )
    .await;

    assert_eq!(outcome.code, 1);
    assert!(!outcome.out.contains("Using default timeout"));
    assert!(!outcome.out.contains("op123"));
    assert!(outcome.err.contains("Timeout"));
    assert_eq!(outcome.err.lines().last(), Some("timeout"));
    assert_eq!(outcome.calls.transfer.get(), 1);
}

#[tokio::test]
async fn empty_rejection_is_reported_as_connection() {
    let outcome = run_with(
        Behavior::RejectEmpty,
        &[
            "transfer", "-n", NODE, "-f", SECRET, "-t", "tz1dest", "-a", "1000", "-p", "100",
        ],
    )
    .await;

    assert_eq!(outcome.code, 1);
    assert!(outcome.err.contains(CONNECTION_MESSAGE));
    assert_eq!(outcome.err.lines().last(), Some("connection"));
}

const BATCH_ARGS: [&str; 11] = [
    "forgeBatchTransfer",
    "-n",
    NODE,
    "-f",
    SECRET,
    "-r",
    "tz1a@10",
    "-p",
    "1420",
    "-m",
    "2",
];

const INJECT_ARGS: [&str; 9] = [
    "inject",
    "-n",
    NODE,
    "-s",
    "beefff",
    "-o",
    OPERATION_OBJECT,
    "-m",
    "2",
];

#[tokio::test(start_paused = true)]
async fn slow_batch_forging_is_reported_as_timeout() {
    let outcome = run_with(Behavior::Delay(Duration::from_secs(30)), &BATCH_ARGS).await;

    assert_eq!(outcome.code, 1);
    assert!(!outcome.out.contains("Signed bytes:"));
    assert_eq!(outcome.err.lines().last(), Some("timeout"));
    assert_eq!(outcome.calls.send_operation.get(), 1);
}

#[tokio::test]
async fn batch_empty_rejection_is_reported_as_connection() {
    let outcome = run_with(Behavior::RejectEmpty, &BATCH_ARGS).await;

    assert_eq!(outcome.code, 1);
    assert!(!outcome.out.contains("Signed bytes:"));
    assert!(outcome.err.contains(CONNECTION_MESSAGE));
    assert_eq!(outcome.err.lines().last(), Some("connection"));
}

#[tokio::test(start_paused = true)]
async fn slow_injection_is_reported_as_timeout() {
    let outcome = run_with(Behavior::Delay(Duration::from_secs(30)), &INJECT_ARGS).await;

    assert_eq!(outcome.code, 1);
    assert!(!outcome.out.contains("opInjected"));
    assert_eq!(outcome.err.lines().last(), Some("timeout"));
    assert_eq!(outcome.calls.inject.get(), 1);
}

#[tokio::test]
async fn inject_empty_rejection_is_reported_as_connection() {
    let outcome = run_with(Behavior::RejectEmpty, &INJECT_ARGS).await;

    assert_eq!(outcome.code, 1);
    assert!(outcome.err.contains(CONNECTION_MESSAGE));
    assert_eq!(outcome.err.lines().last(), Some("connection"));
}

#[tokio::test]
async fn malformed_recipient_blocks_forging() {
    let outcome = run_with(
        Behavior::Resolve,
        &[
            "forgeBatchTransfer",
            "-n",
            NODE,
            "-f",
            SECRET,
            "-r",
            "tz1a@10",
            "-r",
            "tz1b",
            "-p",
            "1420",
            "-m",
            "5",
        ],
    )
    .await;

    assert_eq!(outcome.code, 1);
    assert!(outcome.err.contains("Malformed recipient provided: 'tz1b'"));
    assert_eq!(outcome.calls.send_operation.get(), 0);
    assert_eq!(outcome.calls.provide.get(), 0);
}

#[tokio::test]
async fn batch_builds_one_operation_per_recipient() {
    let outcome = run_with(
        Behavior::Resolve,
        &[
            "forgeBatchTransfer",
            "-n",
            NODE,
            "-f",
            SECRET,
            "-r",
            "tz1a@10",
            "-r",
            "tz1b@20",
            "-r",
            "tz1c@30",
            "-p",
            "1420",
            "-m",
            "5",
        ],
    )
    .await;

    assert_eq!(outcome.code, 0, "stderr: {}", outcome.err);
    assert_eq!(outcome.calls.send_operation.get(), 1);
    assert_eq!(outcome.calls.inject.get(), 0);

    let batch = outcome.calls.last_batch.borrow();
    assert_eq!(batch.len(), 3);
    for operation in batch.iter() {
        assert_eq!(operation.gas_limit, "200");
        assert_eq!(operation.storage_limit, "0");
        assert_eq!(operation.fee, "1420");
    }
    assert_eq!(batch[2].destination, "tz1c");
    assert_eq!(batch[2].amount, "30");

    assert!(outcome.out.contains("Signed bytes: beefff"));
    let object_line = outcome
        .out
        .lines()
        .find_map(|line| line.strip_prefix("Operation object: "))
        .expect("object line");
    let object: OperationObject = serde_json::from_str(object_line).expect("object json");
    assert_eq!(object.signature.as_deref(), Some("edsigmock"));
    assert_eq!(object.contents.len(), 3);
}

#[tokio::test]
async fn batch_requires_timeout() {
    let outcome = run_with(
        Behavior::Resolve,
        &[
            "forgeBatchTransfer",
            "-n",
            NODE,
            "-f",
            SECRET,
            "-r",
            "tz1a@10",
            "-p",
            "1420",
        ],
    )
    .await;

    assert_eq!(outcome.code, 1);
    assert!(outcome.err.contains("No timeout provided."));
    assert_eq!(outcome.calls.network(), 0);
}

#[tokio::test]
async fn extract_rejects_empty_hash() {
    let outcome = run_with(Behavior::Resolve, &["extract", "-s", "edskEmpty"]).await;

    assert_eq!(outcome.code, 1);
    assert!(outcome.err.contains("Bad secret key provided."));
    assert!(outcome.out.is_empty());
}

#[tokio::test]
async fn extract_prints_hash_without_node() {
    let outcome = run_with(Behavior::Resolve, &["extract", "-s", SECRET]).await;

    assert_eq!(outcome.code, 0);
    assert_eq!(outcome.out, "tz1mock\n");
    assert_eq!(outcome.calls.provide.get(), 0);
}

#[tokio::test]
async fn inject_prints_operation_hash() {
    let outcome = run_with(
        Behavior::Resolve,
        &["inject", "-n", NODE, "-s", "beefff", "-o", OPERATION_OBJECT, "-m", "3"],
    )
    .await;

    assert_eq!(outcome.code, 0, "stderr: {}", outcome.err);
    assert!(outcome.out.contains("Operation successfully injected: opInjected"));
    assert_eq!(outcome.calls.inject.get(), 1);
}

#[tokio::test]
async fn usage_errors_exit_with_one() {
    let outcome = run_with(Behavior::Resolve, &[]).await;
    assert_eq!(outcome.code, 1);
    assert!(outcome.err.contains("No action provided."));

    let outcome = run_with(Behavior::Resolve, &["frobnicate"]).await;
    assert_eq!(outcome.code, 1);
    assert!(outcome.err.contains("Invalid action provided: frobnicate."));
    assert!(outcome.err.contains("See --help for available actions."));
}

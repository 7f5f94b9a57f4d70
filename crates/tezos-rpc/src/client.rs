//! Tezos node RPC client.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::crypto::{EDSIG_PREFIX, Keys, Watermark, b58check_encode, sign};
use crate::error::RpcError;
use crate::node::{NodeProvider, TezosNode};
use crate::operation::{ForgedOperation, OperationContent, OperationObject, TransactionDescriptor};
use crate::units::Mutez;

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const HEAD_HEADER: &str = "/chains/main/blocks/head/header";
const FORGE_OPERATIONS: &str = "/chains/main/blocks/head/helpers/forge/operations";
const PREAPPLY_OPERATIONS: &str = "/chains/main/blocks/head/helpers/preapply/operations";
const INJECT_OPERATION: &str = "/injection/operation";

const SIGNATURE_HEX_LEN: usize = 128;

#[derive(Debug, Clone, Deserialize)]
struct BlockHeader {
    hash: String,
    protocol: String,
}

/// One operation group as returned by `helpers/preapply/operations`.
#[derive(Debug, Deserialize)]
struct PreappliedGroup {
    #[serde(default)]
    contents: Vec<PreappliedContent>,
}

#[derive(Debug, Deserialize)]
struct PreappliedContent {
    metadata: Option<ContentMetadata>,
}

#[derive(Debug, Deserialize)]
struct ContentMetadata {
    operation_result: Option<OperationResult>,
}

#[derive(Debug, Deserialize)]
struct OperationResult {
    status: String,
    #[serde(default)]
    errors: Vec<NodeError>,
}

#[derive(Debug, Deserialize)]
struct NodeError {
    id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ForgeRequest<'a> {
    branch: &'a str,
    contents: &'a [OperationContent],
}

/// Client bound to a single node, the equivalent of one `setProvider` call.
#[derive(Debug, Clone)]
pub struct TezosRpcClient {
    base_url: String,
    timeout: Duration,
}

impl TezosRpcClient {
    /// Creates a client for the node at `uri`.
    ///
    /// # Errors
    /// Returns error if `uri` is not an absolute `http` or `https` URL.
    pub fn with_base_url(uri: &str) -> Result<Self, RpcError> {
        let parsed = url::Url::parse(uri).map_err(|e| RpcError::InvalidNodeUri {
            uri: uri.to_owned(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RpcError::InvalidNodeUri {
                uri: uri.to_owned(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            base_url: uri.trim_end_matches('/').to_owned(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs a GET on the blocking pool and decodes the JSON body.
    ///
    /// Dropping the returned future detaches the request instead of cancelling it.
    async fn get<T>(&self, path: &str) -> Result<T, RpcError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let timeout_secs = self.timeout.as_secs();

        debug!(%url, "GET");

        let body = tokio::task::spawn_blocking(move || -> Result<String, RpcError> {
            let response = minreq::get(&url).with_timeout(timeout_secs).send()?;
            read_body(&url, &response)
        })
        .await
        .map_err(|e| RpcError::TaskJoin(e.to_string()))??;

        Ok(serde_json::from_str(&body)?)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, RpcError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let timeout_secs = self.timeout.as_secs();
        let payload = serde_json::to_string(body)?;

        debug!(%url, bytes = payload.len(), "POST");

        let body = tokio::task::spawn_blocking(move || -> Result<String, RpcError> {
            let response = minreq::post(&url)
                .with_timeout(timeout_secs)
                .with_header("Content-Type", "application/json")
                .with_body(payload)
                .send()?;
            read_body(&url, &response)
        })
        .await
        .map_err(|e| RpcError::TaskJoin(e.to_string()))??;

        Ok(serde_json::from_str(&body)?)
    }

    async fn counter(&self, pkh: &str) -> Result<u64, RpcError> {
        let raw: String = self
            .get(&format!("/chains/main/blocks/head/context/contracts/{pkh}/counter"))
            .await?;

        raw.parse::<u64>()
            .map_err(|_| RpcError::UnexpectedResponse(format!("counter '{raw}' for {pkh}")))
    }

    async fn manager_key(&self, pkh: &str) -> Result<Option<String>, RpcError> {
        self.get(&format!(
            "/chains/main/blocks/head/context/contracts/{pkh}/manager_key"
        ))
        .await
    }
}

impl TezosNode for TezosRpcClient {
    async fn transfer(
        &self,
        from: &str,
        keys: &Keys,
        to: &str,
        amount: Mutez,
        fee: Mutez,
    ) -> Result<String, RpcError> {
        let descriptor = TransactionDescriptor::new(to, amount, fee);
        let forged = self
            .send_operation(from, std::slice::from_ref(&descriptor), keys)
            .await?;

        let signed = sign(&forged.opbytes, &keys.sk, Watermark::Generic)?;

        let mut op_ob = forged.op_ob;
        op_ob.signature = Some(signed.edsig);

        self.inject(&op_ob, &signed.sbytes).await
    }

    async fn send_operation(
        &self,
        from: &str,
        operations: &[TransactionDescriptor],
        keys: &Keys,
    ) -> Result<ForgedOperation, RpcError> {
        let header: BlockHeader = self.get(HEAD_HEADER).await?;
        let mut counter = self.counter(from).await?;
        let manager_key = self.manager_key(from).await?;

        let mut contents = Vec::with_capacity(operations.len() + 1);

        if manager_key.is_none() {
            counter += 1;
            contents.push(OperationContent::reveal(from, &keys.pk, counter));
        }

        for descriptor in operations {
            counter += 1;
            contents.push(OperationContent::transaction(from, descriptor, counter));
        }

        let opbytes: String = self
            .post(
                FORGE_OPERATIONS,
                &ForgeRequest {
                    branch: &header.hash,
                    contents: &contents,
                },
            )
            .await?;

        debug!(branch = %header.hash, operations = contents.len(), "forged operation group");

        Ok(ForgedOperation {
            opbytes,
            op_ob: OperationObject {
                branch: header.hash,
                contents,
                protocol: Some(header.protocol),
                signature: None,
            },
        })
    }

    async fn inject(
        &self,
        operation: &OperationObject,
        signed_bytes: &str,
    ) -> Result<String, RpcError> {
        let mut operation = operation.clone();

        if operation.protocol.is_none() {
            let header: BlockHeader = self.get(HEAD_HEADER).await?;
            operation.protocol = Some(header.protocol);
        }
        if operation.signature.is_none() {
            operation.signature = Some(signature_from_sbytes(signed_bytes)?);
        }

        let applied: Vec<PreappliedGroup> = self
            .post(PREAPPLY_OPERATIONS, std::slice::from_ref(&operation))
            .await?;
        check_preapply(&applied)?;

        self.post(INJECT_OPERATION, signed_bytes).await
    }
}

/// Builds one [`TezosRpcClient`] per node URI.
#[derive(Debug, Clone, Copy)]
pub struct RpcProvider {
    request_timeout: Duration,
}

impl RpcProvider {
    #[must_use]
    pub const fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

impl NodeProvider for RpcProvider {
    type Node = TezosRpcClient;

    fn provide(&self, uri: &str) -> Result<Self::Node, RpcError> {
        Ok(TezosRpcClient::with_base_url(uri)?.with_timeout(self.request_timeout))
    }
}

fn read_body(url: &str, response: &minreq::Response) -> Result<String, RpcError> {
    let status = response.status_code;
    let body = response.as_str().unwrap_or("").trim().to_owned();

    if !(200..300).contains(&status) {
        return Err(RpcError::Rejected {
            status: u16::try_from(status).unwrap_or_default(),
            url: url.to_owned(),
            message: body,
        });
    }

    Ok(body)
}

/// Recovers the `edsig` from signed bytes, whose last 64 bytes are the signature.
fn signature_from_sbytes(sbytes: &str) -> Result<String, RpcError> {
    let split = sbytes
        .len()
        .checked_sub(SIGNATURE_HEX_LEN)
        .filter(|&at| at > 0 && sbytes.is_char_boundary(at))
        .ok_or_else(|| RpcError::UnexpectedResponse("signed bytes are too short".to_string()))?;

    let signature = hex::decode(&sbytes[split..]).map_err(crate::error::KeyError::from)?;

    Ok(b58check_encode(&EDSIG_PREFIX, &signature))
}

/// Fails when any pre-applied content did not reach the `applied` status.
fn check_preapply(applied: &[PreappliedGroup]) -> Result<(), RpcError> {
    let failures: Vec<String> = applied
        .iter()
        .flat_map(|group| &group.contents)
        .filter_map(|content| content.metadata.as_ref()?.operation_result.as_ref())
        .filter(|result| result.status != "applied")
        .map(|result| {
            let ids = result
                .errors
                .iter()
                .filter_map(|error| error.id.as_deref())
                .collect::<Vec<_>>()
                .join(", ");

            if ids.is_empty() {
                result.status.clone()
            } else {
                format!("{} ({ids})", result.status)
            }
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(RpcError::Preapply(failures.join("; ")))
    }
}

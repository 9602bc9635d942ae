// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptionCallback, Disclosure};
use actix::prelude::*;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use tracing::{error, info};
use veil_config::OracleMode;
use veil_disclosure::{DecryptionResponse, SimulatedKms};
use veil_events::{BusHandle, DisclosureRequested, EngineEvent, EngineEventData, Event, RequestId};

/// Answer a held request and deliver the callback to the engine
#[derive(Message, Clone, Debug)]
#[rtype(result = "anyhow::Result<Disclosure>")]
pub struct FulfillRequest(pub RequestId);

/// Answer a held request without delivering it. The caller decides when, and whether, the
/// engine sees the callback.
#[derive(Message, Clone, Debug)]
#[rtype(result = "anyhow::Result<DecryptionResponse>")]
pub struct TakeResponse(pub RequestId);

/// Forget a held request so it is never answered
#[derive(Message, Clone, Debug)]
#[rtype(result = "bool")]
pub struct DropRequest(pub RequestId);

#[derive(Message, Clone, Debug)]
#[rtype(result = "Vec<RequestId>")]
pub struct GetPendingRequests;

/// Off-chain decryption oracle. Listens for `DisclosureRequested`, decrypts through the
/// simulated KMS and calls the engine back with a signed response.
///
/// In [`OracleMode::Immediate`] every request is answered as soon as it is seen. In
/// [`OracleMode::Manual`] requests are held until told otherwise. A superseded request is
/// dropped either way.
pub struct SimulatedOracle {
    kms: SimulatedKms,
    engine: Recipient<DecryptionCallback>,
    mode: OracleMode,
    held: BTreeMap<RequestId, DisclosureRequested>,
}

impl SimulatedOracle {
    pub fn new(kms: SimulatedKms, engine: Recipient<DecryptionCallback>, mode: OracleMode) -> Self {
        Self {
            kms,
            engine,
            mode,
            held: BTreeMap::new(),
        }
    }

    pub fn attach(
        bus: &BusHandle,
        kms: SimulatedKms,
        engine: Recipient<DecryptionCallback>,
        mode: OracleMode,
    ) -> Addr<Self> {
        let addr = Self::new(kms, engine, mode).start();
        bus.subscribe("DisclosureRequested", addr.clone().recipient());
        addr
    }

    fn respond(&mut self, request_id: RequestId) -> Result<DecryptionResponse> {
        let request = self
            .held
            .remove(&request_id)
            .ok_or_else(|| anyhow!("oracle holds no request {}", request_id))?;
        Ok(self.kms.fulfil(request_id, &request.handles)?)
    }

    fn fulfil(&mut self, request_id: RequestId) -> ResponseFuture<Result<Disclosure>> {
        let response = self.respond(request_id);
        let engine = self.engine.clone();
        Box::pin(async move {
            let callback = DecryptionCallback::from(response?);
            let disclosure = engine.send(callback).await??;
            Ok(disclosure)
        })
    }
}

impl Actor for SimulatedOracle {
    type Context = Context<Self>;
}

impl Handler<EngineEvent> for SimulatedOracle {
    type Result = ();
    fn handle(&mut self, msg: EngineEvent, ctx: &mut Self::Context) -> Self::Result {
        let EngineEventData::DisclosureRequested(data) = msg.into_data() else {
            return;
        };
        if let Some(old) = data.supersedes {
            if self.held.remove(&old).is_some() {
                info!("dropped {} superseded by {}", old, data.request_id);
            }
        }
        let request_id = data.request_id;
        self.held.insert(request_id, data);

        if self.mode == OracleMode::Immediate {
            let fut = self.fulfil(request_id);
            ctx.spawn(
                async move {
                    if let Err(err) = fut.await {
                        error!("oracle could not complete {}: {}", request_id, err);
                    }
                }
                .into_actor(self),
            );
        }
    }
}

impl Handler<FulfillRequest> for SimulatedOracle {
    type Result = ResponseFuture<Result<Disclosure>>;
    fn handle(&mut self, msg: FulfillRequest, _: &mut Self::Context) -> Self::Result {
        self.fulfil(msg.0)
    }
}

impl Handler<TakeResponse> for SimulatedOracle {
    type Result = Result<DecryptionResponse>;
    fn handle(&mut self, msg: TakeResponse, _: &mut Self::Context) -> Self::Result {
        self.respond(msg.0)
    }
}

impl Handler<DropRequest> for SimulatedOracle {
    type Result = bool;
    fn handle(&mut self, msg: DropRequest, _: &mut Self::Context) -> Self::Result {
        self.held.remove(&msg.0).is_some()
    }
}

impl Handler<GetPendingRequests> for SimulatedOracle {
    type Result = Vec<RequestId>;
    fn handle(&mut self, _: GetPendingRequests, _: &mut Self::Context) -> Self::Result {
        self.held.keys().copied().collect()
    }
}

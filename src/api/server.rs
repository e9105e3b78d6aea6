use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response};
use tokio::runtime::{Builder, Runtime};
use tracing::{error, info, info_span, Instrument};

use super::router;
use crate::datastore::TaskDataStore;
use crate::model::CorrelationId;

pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

pub struct Server<D> {
    config: ServerConfig,
    datastore: Arc<D>,
}

impl<D> Server<D>
where
    D: TaskDataStore,
{
    pub fn new(config: ServerConfig, datastore: Arc<D>) -> Server<D> {
        Server { config, datastore }
    }

    /// Binds the listener and returns its address together with the future
    /// serving requests until `shutdown` resolves.
    pub fn bind<F>(self, shutdown: F) -> Result<(SocketAddr, impl Future<Output = Result<()>>)>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let saddr = SocketAddr::new(self.config.host, self.config.port);
        let datastore = self.datastore;

        let make_svc = make_service_fn(move |conn: &AddrStream| {
            let datastore = datastore.clone();
            let remote_addr = conn.remote_addr();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    handle(datastore.clone(), remote_addr, req)
                }))
            }
        });

        let server = hyper::Server::try_bind(&saddr)?.serve(make_svc);
        let local_addr = server.local_addr();
        let serving = async move {
            server.with_graceful_shutdown(shutdown).await?;
            Ok(())
        };
        Ok((local_addr, serving))
    }

    pub async fn start<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(backend = self.datastore.backend(), "Starting api...");
        let (local_addr, serving) = match self.bind(shutdown) {
            Ok(bound) => bound,
            Err(err) => {
                error!(reason = %err, "Unable to start API.");
                anyhow::bail!("Unable to start API: {}", err)
            }
        };
        info!(addr = %local_addr, "Listening.");

        if let Err(err) = serving.await {
            error!(reason = %err, "API stopped with an error.");
            return Err(err);
        }
        info!("API stopped.");
        Ok(())
    }
}

impl<D> fmt::Debug for Server<D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tasklist_http_server")
    }
}

async fn handle<D: TaskDataStore>(
    datastore: Arc<D>,
    remote_addr: SocketAddr,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    let correlation_id = CorrelationId::from_header_map_or_new(req.headers());
    let span = info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        remote = %remote_addr,
        correlation_id = %correlation_id,
    );

    async move {
        let started = Instant::now();
        let mut res = router::route(datastore.as_ref(), req).await;
        if let Err(err) = correlation_id.insert_into_header_map(res.headers_mut()) {
            error!(reason = %err, "Unable to set correlation-id header.");
        }
        info!(
            status = res.status().as_u16(),
            latency = ?started.elapsed(),
            "Request handled."
        );
        Ok(res)
    }
    .instrument(span)
    .await
}

pub fn build_runtime() -> std::io::Result<Runtime> {
    Builder::new_multi_thread()
        .thread_name("http-api")
        .enable_all()
        .build()
}

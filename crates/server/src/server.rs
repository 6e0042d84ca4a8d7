use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Server};

use chunkport_service::UploadService;

use crate::{ServerError, routes};

/// Runs the HTTP server until the listener fails.
pub async fn serve(addr: SocketAddr, service: Arc<UploadService>) -> Result<(), ServerError> {
    let make_svc = make_service_fn(move |conn: &AddrStream| {
        let remote_addr = conn.remote_addr();
        let service = service.clone();

        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let service = service.clone();
                async move {
                    tracing::info!(
                        remote_addr = %remote_addr,
                        method = %req.method(),
                        path = %req.uri().path(),
                    );
                    Ok::<_, Infallible>(routes::handle(req, service).await)
                }
            }))
        }
    });

    tracing::info!("listening on {addr}");
    Server::bind(&addr).serve(make_svc).await?;
    Ok(())
}

//! Render dispatch for intercepted requests.

use std::sync::Arc;

use http::header::{CONTENT_TYPE, TRANSFER_ENCODING};
use http::{Response, StatusCode};
use swsr_core::{RenderError, RenderMode, RequestContext, SwsrConfig, Template};
use swsr_data::{collect_chunks, WorkerTable};
use swsr_observability::StructuredLogger;
use swsr_streaming::{StreamRenderer, StringRenderer};
use swsr_view::App;

use crate::host::{Body, Host, NetworkError};
use crate::mode::ModeSelector;
use crate::route::RouteMatcher;

/// Answers intercepted requests.
///
/// Holds only immutable inputs plus the once-written mode, so one
/// dispatcher serves every request of the interceptor's lifetime.
pub struct Dispatcher {
    config: SwsrConfig,
    template: Template,
    workers: WorkerTable,
    app: Arc<dyn App>,
    host: Arc<dyn Host>,
    routes: RouteMatcher,
    mode: ModeSelector,
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(
        config: SwsrConfig,
        template: Template,
        workers: WorkerTable,
        app: impl App + 'static,
        host: impl Host + 'static,
    ) -> Self {
        let routes = RouteMatcher::from_config(&config);
        let mode = ModeSelector::new(config.mode);
        Self {
            config,
            template,
            workers,
            app: Arc::new(app),
            host: Arc::new(host),
            routes,
            mode,
        }
    }

    /// Get the render mode, if selected yet.
    pub fn mode(&self) -> Option<RenderMode> {
        self.mode.selected()
    }

    /// Answer one request.
    ///
    /// Requests that are not rendered go to the network untouched. A render
    /// that fails before producing output also goes to the network, so a
    /// broken render degrades to the uncached page rather than an error.
    pub async fn handle(&self, request: RequestContext) -> Result<Response<Body>, NetworkError> {
        let logger = StructuredLogger::new(request.request_id.clone()).with_route(request.path());

        if !self.routes.matches(&request) {
            return self.host.fetch(request).await;
        }

        if !self.template.matches_version(self.config.version.as_deref()) {
            logger
                .debug_builder("template version mismatch, passing through")
                .field("version", self.config.version.clone().unwrap_or_default())
                .emit();
            return self.host.fetch(request).await;
        }

        let mode = self.mode.select(self.host.as_ref());
        let logger = logger.with_mode(mode);

        match self.render(mode, &request).await {
            Ok(response) => {
                logger.debug("response ready");
                Ok(response)
            }
            Err(e) => {
                logger
                    .warn_builder("render failed, falling back to network")
                    .field("error", e.to_string())
                    .emit();
                self.host.fetch(request).await
            }
        }
    }

    async fn render(
        &self,
        mode: RenderMode,
        request: &RequestContext,
    ) -> Result<Response<Body>, RenderError> {
        let chunks = collect_chunks(&self.workers, request);

        let body = match mode {
            RenderMode::String => Body::Full(
                StringRenderer::new(self.template.clone())
                    .render(self.app.as_ref(), &chunks)
                    .await?,
            ),
            RenderMode::Stream => Body::Stream(
                StreamRenderer::new(self.template.clone())
                    .render(self.app.as_ref(), chunks)
                    .await?,
            ),
        };

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "text/html");
        if body.is_stream() {
            builder = builder.header(TRANSFER_ENCODING, "chunked");
        }
        builder.body(body).map_err(RenderError::render)
    }
}

//! Whole-pipeline scenarios: interceptor in, page globals out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use http::header::{HeaderValue, TRANSFER_ENCODING};
use http::{Method, Response};
use serde_json::json;
use swsr_sdk::prelude::*;

const TEMPLATE: &str = "<!DOCTYPE html><html><head><!-- __SWSR_SCRIPT_PLACEHOLDER__ --></head><body><div id=\"root\"><!-- __SWSR_CONTENT_PLACEHOLDER__ --></div></body></html>";

#[derive(Clone, Default)]
struct TestHost {
    streaming: bool,
    fetches: Arc<AtomicUsize>,
}

#[async_trait]
impl Host for TestHost {
    fn supports_streaming(&self) -> bool {
        self.streaming
    }

    async fn fetch(&self, _request: RequestContext) -> Result<Response<Body>, NetworkError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(Response::new(Body::from("<html>from network</html>")))
    }
}

fn navigation(path: &str) -> RequestContext {
    let mut request = RequestContext::new(Method::GET, path.parse().unwrap());
    request
        .headers
        .insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    request
}

fn boundary(cx: &RenderContext, name: &str) -> View {
    cx.use_chunk(name, |v| View::text(format!("ok:{}", v.as_str().unwrap_or_default())))
        .pending(format!("loading:{}", name))
        .rejected_with(|m| View::text(format!("failed:{}", m.unwrap_or("?"))))
        .into()
}

// === String Mode ===

#[tokio::test]
async fn test_string_mode_end_to_end() {
    let workers = WorkerTable::new()
        .register("a", |_| async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<_, String>("X")
        })
        .register("b", |_| async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Err::<String, _>("boom")
        });
    let app = |cx: &RenderContext| -> Result<View, RenderError> {
        Ok(Element::new("main")
            .child(boundary(cx, "a"))
            .child(boundary(cx, "b"))
            .into())
    };
    let dispatcher = Dispatcher::new(
        SwsrConfig::new().with_mode(RenderMode::String),
        Template::new(TEMPLATE),
        workers,
        app,
        TestHost::default(),
    );

    let response = dispatcher.handle(navigation("/")).await.unwrap();
    let html = response.into_body().into_string().await.unwrap();

    assert!(html.contains("<main>ok:Xfailed:boom</main>"));

    let globals = PageGlobals::from_document(&html).unwrap();
    assert_eq!(globals.mode(), Some(RenderMode::String));
    assert_eq!(
        globals.embedded().cloned().map(serde_json::Value::Object),
        Some(json!({"a": "X", "b": {"__SWSR_ERROR__": {"message": "boom"}}}))
    );
    assert_eq!(html.matches("\"a\":").count(), 1);
    assert_eq!(html.matches("\"b\":").count(), 1);

    let cx = Hydration::bootstrap(&globals).context().unwrap();
    let b = ChunkReader::new(cx.chunk("b").unwrap().clone());
    assert!(matches!(b.read(), ChunkState::Failed(Some("boom"))));
}

// === Stream Mode ===

#[tokio::test]
async fn test_stream_mode_end_to_end() {
    let workers = WorkerTable::new().register("c", |_| async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok::<_, String>("streamed")
    });
    let app = |cx: &RenderContext| -> Result<View, RenderError> {
        Ok(View::fragment([
            Element::new("h1").child("Title").into(),
            boundary(cx, "c"),
        ]))
    };
    let host = TestHost {
        streaming: true,
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(
        SwsrConfig::new(),
        Template::new(TEMPLATE),
        workers,
        app,
        host,
    );

    let response = dispatcher.handle(navigation("/")).await.unwrap();
    assert_eq!(dispatcher.mode(), Some(RenderMode::Stream));
    assert_eq!(response.headers()[TRANSFER_ENCODING], "chunked");

    let mut body = match response.into_body() {
        Body::Stream(body) => body,
        Body::Full(_) => panic!("expected a streamed body"),
    };

    let shell = String::from_utf8(body.next().await.unwrap().unwrap()).unwrap();
    assert!(shell.contains("<h1>Title</h1><!--$?--><template id=\"B:0\"></template>loading:c<!--/$-->"));
    assert!(shell.contains("__SWSR_CREATE_CONNECTIONS__([\"c\"])"));
    assert!(!shell.contains("[\"c\"].resolve"));

    // The page can already hydrate from the shell alone.
    let early = PageGlobals::from_document(&shell).unwrap();
    assert_eq!(early.registry().unwrap().get("c").unwrap().status(), ConnectionStatus::Pending);

    let mut document = shell;
    while let Some(item) = body.next().await {
        document.push_str(&String::from_utf8(item.unwrap()).unwrap());
    }

    let resolve = wire::resolve_script("c", &json!("streamed")).unwrap();
    assert_eq!(document.matches(&resolve).count(), 1);
    assert!(document.contains("<div hidden id=\"S:0\">ok:streamed</div>"));

    let globals = PageGlobals::from_document(&document).unwrap();
    let cx = match Hydration::bootstrap(&globals) {
        hydration @ Hydration::Hydrate { .. } => hydration.context().unwrap(),
        Hydration::ClientRender => panic!("expected hydration"),
    };
    let mut slot = ReaderSlot::new();
    let reader = slot.reader(cx.chunk("c").unwrap());
    assert!(matches!(reader.read(), ChunkState::Ready(v) if *v == json!("streamed")));
}

// === Fail-open ===

#[tokio::test]
async fn test_broken_render_falls_back_to_network() {
    for mode in [RenderMode::String, RenderMode::Stream] {
        let host = TestHost::default();
        let app = |_: &RenderContext| -> Result<View, RenderError> {
            Ok(View::lazy(|| Err(RenderError::Render("component threw".into()))))
        };
        let dispatcher = Dispatcher::new(
            SwsrConfig::new().with_mode(mode),
            Template::new(TEMPLATE),
            WorkerTable::new(),
            app,
            host.clone(),
        );

        let response = dispatcher.handle(navigation("/")).await.unwrap();

        assert_eq!(
            response.into_body().into_string().await.unwrap(),
            "<html>from network</html>"
        );
        assert_eq!(host.fetches.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_stream_truncation_reported_by_sink() {
    let app = |cx: &RenderContext| -> Result<View, RenderError> {
        Ok(cx
            .use_chunk("c", |_| View::lazy(|| Err(RenderError::Render("late".into()))))
            .into())
    };
    let (settle_tx, settle_rx) = futures::channel::oneshot::channel::<ChunkResult>();
    let chunk = Chunk::pending(async move {
        settle_rx
            .await
            .unwrap_or_else(|_| Err(ChunkError::new("canceled")))
    });
    let chunks: ChunkMap = [("c", chunk)].into_iter().collect();

    let body = StreamRenderer::new(Template::new(TEMPLATE))
        .render(&app, chunks)
        .await
        .unwrap();
    settle_tx.send(Ok(json!(1))).unwrap();

    let (tx, rx) = futures::channel::mpsc::unbounded();
    let mut sink = StreamingSink::new(tx, TimingContext::new());
    let err = sink.forward(body).await.unwrap_err();

    assert!(matches!(err, RenderError::Truncated(_)));
    assert!(matches!(sink.phase(), LifecyclePhase::Error(_)));
    drop(sink);
    let received: Vec<Vec<u8>> = rx.collect().await;
    assert!(String::from_utf8_lossy(&received[0]).contains("swsr-runtime"));
}

//! End-to-end dispatch tests for courier
//!
//! These tests exercise the full flow: registration (both shapes, both
//! surfaces), resolution, the validation gate, handler invocation, and the
//! error taxonomy. Tests that touch the process-wide default registry use
//! request types unique to that test, since entries live for the whole test
//! process.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{Duration, sleep};

use courier::{
    BoxError, DispatchError, Handler, HandlerActivator, HandlerBlueprint, HandlerFn,
    HandlerInstance, Mediator, Pipeline, Registry, Request, RequestExt, Validator,
};

#[derive(Debug, Error)]
#[error("value must be non-negative, got {0}")]
struct NegativeValue(i64);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[tokio::test]
async fn function_handler_round_trip() {
    init_tracing();

    struct Ping;

    impl Request for Ping {
        type Response = &'static str;
    }

    courier::register_handler_fn(|_request: Ping| "pong");

    let mediator = Mediator::new();
    assert_eq!(mediator.send(Ping).await.unwrap(), "pong");
}

#[tokio::test]
async fn object_handler_is_constructed_per_dispatch() {
    struct Greet {
        name: &'static str,
    }

    impl Request for Greet {
        type Response = String;
    }

    #[derive(Default)]
    struct GreetHandler;

    #[async_trait]
    impl Handler for GreetHandler {
        type Request = Greet;

        async fn handle(&self, request: Greet) -> String {
            format!("hello, {}", request.name)
        }
    }

    courier::register_handler::<GreetHandler>();

    let mediator = Mediator::new();
    assert_eq!(
        mediator.send(Greet { name: "ada" }).await.unwrap(),
        "hello, ada"
    );
}

#[tokio::test]
async fn async_handler_result_is_awaited_transparently() {
    struct Delayed;

    impl Request for Delayed {
        type Response = u64;
    }

    courier::register_handler_fn::<Delayed, _, _>(|_request: Delayed| async {
        sleep(Duration::from_millis(5)).await;
        42u64
    });

    let mediator = Mediator::new();
    assert_eq!(mediator.send(Delayed).await.unwrap(), 42);
}

#[tokio::test]
async fn failed_validation_aborts_before_the_handler_runs() {
    static HANDLED: AtomicU64 = AtomicU64::new(0);

    struct Withdraw {
        amount: i64,
    }

    impl Request for Withdraw {
        type Response = i64;
    }

    let registry = Arc::new(Registry::new());
    registry.register_handler_fn(|request: Withdraw| {
        HANDLED.fetch_add(1, Ordering::SeqCst);
        request.amount
    });
    registry.register_validator_fn(|request: Withdraw| {
        if request.amount < 0 {
            return Err(NegativeValue(request.amount));
        }
        Ok(request)
    });

    let mediator = Mediator::builder().registry(registry).build();

    let err = mediator.send(Withdraw { amount: -5 }).await.unwrap_err();
    let DispatchError::Validation(source) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(source.downcast_ref::<NegativeValue>().is_some());
    assert_eq!(HANDLED.load(Ordering::SeqCst), 0);

    assert_eq!(mediator.send(Withdraw { amount: 5 }).await.unwrap(), 5);
    assert_eq!(HANDLED.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn validator_may_normalize_the_request() {
    struct SetVolume {
        level: u32,
    }

    impl Request for SetVolume {
        type Response = u32;
    }

    let registry = Arc::new(Registry::new());
    registry.register_handler_fn(|request: SetVolume| request.level);
    registry.register_validator_fn(|mut request: SetVolume| {
        request.level = request.level.min(11);
        Ok::<_, BoxError>(request)
    });

    let mediator = Mediator::builder().registry(registry).build();
    assert_eq!(mediator.send(SetVolume { level: 200 }).await.unwrap(), 11);
}

#[tokio::test]
async fn unknown_request_fails_with_handler_not_found() {
    struct Unknown {
        marker: u8,
    }

    impl Request for Unknown {
        type Response = ();
    }

    let mediator = Mediator::new();
    let err = mediator.send(Unknown { marker: 7 }).await.unwrap_err();

    let DispatchError::HandlerNotFound(envelope) = err else {
        panic!("expected HandlerNotFound, got {err:?}");
    };
    assert!(envelope.type_name().ends_with("Unknown"));
    assert_eq!(envelope.downcast_ref::<Unknown>().unwrap().marker, 7);
}

#[tokio::test]
async fn none_request_is_rejected_regardless_of_registry() {
    struct Probe;

    impl Request for Probe {
        type Response = ();
    }

    // Empty registry and populated registry behave the same for `None`.
    let empty = Mediator::builder().registry(Arc::new(Registry::new())).build();
    assert!(matches!(
        empty.send::<Probe>(None).await.unwrap_err(),
        DispatchError::InvalidRequest
    ));

    let registry = Arc::new(Registry::new());
    registry.register_handler_fn(|_request: Probe| ());
    let populated = Mediator::builder().registry(registry).build();
    assert!(matches!(
        populated.send::<Probe>(None).await.unwrap_err(),
        DispatchError::InvalidRequest
    ));
}

#[tokio::test]
async fn first_registration_wins() {
    struct Version;

    impl Request for Version {
        type Response = &'static str;
    }

    let registry = Arc::new(Registry::new());
    registry.register_handler_fn(|_request: Version| "first");
    registry.register_handler_fn(|_request: Version| "second");

    let mediator = Mediator::builder().registry(registry).build();
    assert_eq!(mediator.send(Version).await.unwrap(), "first");
}

#[tokio::test]
async fn decorator_style_registration_returns_the_function() {
    struct Square(i64);

    impl Request for Square {
        type Response = i64;
    }

    let square = courier::handler(|request: Square| request.0 * request.0);

    // The function is handed back unchanged and stays directly callable.
    assert_eq!(square.invoke(Square(3)).await, 9);

    let mediator = Mediator::new();
    assert_eq!(mediator.send(Square(4)).await.unwrap(), 16);
}

#[tokio::test]
async fn fluent_send_via_dispatches_the_same_way() {
    struct Ray;

    impl Request for Ray {
        type Response = &'static str;
    }

    let registry = Arc::new(Registry::new());
    registry.register_handler_fn(|_request: Ray| "traced");

    let mediator = Mediator::builder().registry(registry).build();
    assert_eq!(Ray.send_via(&mediator).await.unwrap(), "traced");
}

#[tokio::test]
async fn custom_activator_sees_both_pipelines() {
    struct Transfer {
        amount: i64,
    }

    impl Request for Transfer {
        type Response = i64;
    }

    #[derive(Default)]
    struct TransferHandler;

    #[async_trait]
    impl Handler for TransferHandler {
        type Request = Transfer;

        async fn handle(&self, request: Transfer) -> i64 {
            request.amount
        }
    }

    #[derive(Default)]
    struct TransferValidator;

    #[async_trait]
    impl Validator for TransferValidator {
        type Request = Transfer;

        async fn validate(&self, request: Transfer) -> Result<Transfer, BoxError> {
            if request.amount < 0 {
                return Err(Box::new(NegativeValue(request.amount)));
            }
            Ok(request)
        }
    }

    #[derive(Default)]
    struct CountingActivator {
        handler_activations: AtomicU64,
        validation_activations: AtomicU64,
    }

    impl HandlerActivator for CountingActivator {
        fn activate(
            &self,
            blueprint: &HandlerBlueprint,
            pipeline: Pipeline,
        ) -> Result<HandlerInstance, BoxError> {
            match pipeline {
                Pipeline::Handler => self.handler_activations.fetch_add(1, Ordering::SeqCst),
                Pipeline::Validation => {
                    self.validation_activations.fetch_add(1, Ordering::SeqCst)
                }
            };
            Ok(blueprint.construct())
        }
    }

    let registry = Arc::new(Registry::new());
    registry.register_handler::<TransferHandler>();
    registry.register_validator::<TransferValidator>();

    let activator = Arc::new(CountingActivator::default());
    let counts = Arc::clone(&activator);

    struct SharedActivator(Arc<CountingActivator>);

    impl HandlerActivator for SharedActivator {
        fn activate(
            &self,
            blueprint: &HandlerBlueprint,
            pipeline: Pipeline,
        ) -> Result<HandlerInstance, BoxError> {
            self.0.activate(blueprint, pipeline)
        }
    }

    let mediator = Mediator::builder()
        .registry(registry)
        .activator(SharedActivator(activator))
        .build();

    assert_eq!(mediator.send(Transfer { amount: 10 }).await.unwrap(), 10);
    assert_eq!(counts.handler_activations.load(Ordering::SeqCst), 1);
    assert_eq!(counts.validation_activations.load(Ordering::SeqCst), 1);

    // Each dispatch activates afresh.
    assert_eq!(mediator.send(Transfer { amount: 3 }).await.unwrap(), 3);
    assert_eq!(counts.handler_activations.load(Ordering::SeqCst), 2);
    assert_eq!(counts.validation_activations.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn mistyped_activator_fails_with_invalid_handler() {
    struct Audit;

    impl Request for Audit {
        type Response = ();
    }

    #[derive(Default)]
    struct AuditHandler;

    #[async_trait]
    impl Handler for AuditHandler {
        type Request = Audit;

        async fn handle(&self, _request: Audit) {}
    }

    struct WrongTypeActivator;

    impl HandlerActivator for WrongTypeActivator {
        fn activate(
            &self,
            _blueprint: &HandlerBlueprint,
            _pipeline: Pipeline,
        ) -> Result<HandlerInstance, BoxError> {
            Ok(Box::new("not a handler"))
        }
    }

    let registry = Arc::new(Registry::new());
    registry.register_handler::<AuditHandler>();

    let mediator = Mediator::builder()
        .registry(registry)
        .activator(WrongTypeActivator)
        .build();

    let err = mediator.send(Audit).await.unwrap_err();
    assert!(matches!(err, DispatchError::InvalidHandler { .. }));
}

#[tokio::test]
async fn failing_activator_surfaces_its_error_as_source() {
    struct Report;

    impl Request for Report {
        type Response = ();
    }

    #[derive(Default)]
    struct ReportHandler;

    #[async_trait]
    impl Handler for ReportHandler {
        type Request = Report;

        async fn handle(&self, _request: Report) {}
    }

    struct EmptyContainerActivator;

    impl HandlerActivator for EmptyContainerActivator {
        fn activate(
            &self,
            blueprint: &HandlerBlueprint,
            _pipeline: Pipeline,
        ) -> Result<HandlerInstance, BoxError> {
            Err(format!("no binding for {}", blueprint.type_name()).into())
        }
    }

    let registry = Arc::new(Registry::new());
    registry.register_handler::<ReportHandler>();

    let mediator = Mediator::builder()
        .registry(registry)
        .activator(EmptyContainerActivator)
        .build();

    let err = mediator.send(Report).await.unwrap_err();
    let DispatchError::InvalidHandler { source, .. } = err else {
        panic!("expected InvalidHandler, got {err:?}");
    };
    assert!(source.unwrap().to_string().contains("no binding"));
}

#[tokio::test]
async fn metrics_reflect_the_dispatch_outcomes() {
    struct Tick;

    impl Request for Tick {
        type Response = ();
    }

    let registry = Arc::new(Registry::new());
    registry.register_handler_fn(|_request: Tick| ());
    registry.register_validator_fn(|_request: Tick| {
        Err::<Tick, _>(NegativeValue(-1))
    });

    let mediator = Mediator::builder().registry(registry).build();

    mediator.send(Tick).await.unwrap_err(); // validation rejects
    mediator.send::<Tick>(None).await.unwrap_err(); // invalid request

    let snapshot = mediator.metrics().snapshot();
    assert_eq!(snapshot.completed, 0);
    assert_eq!(snapshot.failed, 1);
    assert_eq!(snapshot.validations_rejected, 1);
}

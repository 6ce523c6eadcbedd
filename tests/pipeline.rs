//! End-to-end runs of the built-in algorithms through the process-wide
//! services, the async executor and the C interface.

use parking_lot::Mutex;
use reductionrs::{
    bootstrap, AlgorithmEvent, AnalysisDataService, AsyncExecutor, EventMask, FrameworkConfig, FrameworkError,
    RdxStatus, RuntimeConfig, Workspace2D,
};
use reductionrs::{
    rdx_algorithm_create, rdx_algorithm_execute, rdx_algorithm_free, rdx_algorithm_get_property,
    rdx_algorithm_set_property, rdx_framework_init, rdx_last_error_message, AlgorithmHandle,
};
use std::ffi::{CStr, CString};
use std::ptr;
use std::sync::Arc;

fn workspace(name: &str) -> Workspace2D {
    let handle = AnalysisDataService::instance().unwrap().retrieve(name).unwrap();
    handle.downcast_ref::<Workspace2D>().unwrap().clone()
}

#[test]
fn test_create_scale_normalise() {
    let manager = bootstrap(&FrameworkConfig::default()).unwrap();

    let mut create = manager.create("CreateWorkspace", None).unwrap();
    create.set_property("DataY", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    create.set_property("NSpec", 2i64).unwrap();
    create.set_property("OutputWorkspace", "pipe_raw").unwrap();
    create.execute().unwrap();

    let mut scale = manager.create("Scale", None).unwrap();
    scale.set_property_value("InputWorkspace", "pipe_raw").unwrap();
    scale.set_property("Factor", 2.0).unwrap();
    scale.set_property("OutputWorkspace", "pipe_scaled").unwrap();
    scale.execute().unwrap();
    assert_eq!(workspace("pipe_scaled").y().row(1).to_vec(), vec![8.0, 10.0, 12.0]);

    let mut normalise = manager.create("NormaliseToMax", None).unwrap();
    normalise.set_property_value("InputWorkspace", "pipe_scaled").unwrap();
    normalise.set_property("OutputWorkspace", "pipe_norm").unwrap();
    normalise.execute().unwrap();

    let y = workspace("pipe_norm").y().clone();
    assert!((y[[1, 2]] - 1.0).abs() < 1e-12);
    assert!((y[[0, 0]] - 1.0 / 6.0).abs() < 1e-12);

    let record = &normalise.history()[0];
    assert_eq!(record.children.len(), 1);
    assert_eq!(record.children[0].name, "Scale");
    assert_eq!(
        record.to_call_string(),
        "NormaliseToMax(InputWorkspace='pipe_scaled', OutputWorkspace='pipe_norm')"
    );
}

#[test]
fn test_invalid_shape_is_reported_before_running() {
    let manager = bootstrap(&FrameworkConfig::default()).unwrap();
    let mut create = manager.create("CreateWorkspace", None).unwrap();
    create.set_property("DataY", vec![1.0, 2.0, 3.0]).unwrap();
    create.set_property("NSpec", 2i64).unwrap();
    create.set_property("OutputWorkspace", "pipe_bad_shape").unwrap();

    let FrameworkError::Validation(failures) = create.execute().unwrap_err() else {
        panic!("expected validation failure");
    };
    assert_eq!(failures.property_names(), vec!["DataY"]);
    assert!(!AnalysisDataService::instance().unwrap().does_exist("pipe_bad_shape"));
}

#[test]
fn test_bootstrap_is_repeatable() {
    let first = bootstrap(&FrameworkConfig::default()).unwrap();
    let second = bootstrap(&FrameworkConfig::default()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.factory().names(), vec!["CreateWorkspace", "NormaliseToMax", "Scale"]);
}

// =============================================================================
// Async execution
// =============================================================================

#[test]
fn test_async_runs_report_progress_and_return_the_instance() {
    let manager = bootstrap(&FrameworkConfig::default()).unwrap();
    let executor = AsyncExecutor::new(RuntimeConfig { worker_count: 2 }).unwrap();

    let mut create = manager.create("CreateWorkspace", None).unwrap();
    create.set_property("DataY", vec![0.5; 32]).unwrap();
    create.set_property("NSpec", 8i64).unwrap();
    create.set_property("OutputWorkspace", "pipe_async_raw").unwrap();

    let (create, result) = executor.wait(executor.execute_async(create)).unwrap();
    result.unwrap();
    assert!(create.is_executed());

    let mut scale = manager.create("Scale", None).unwrap();
    scale.set_property_value("InputWorkspace", "pipe_async_raw").unwrap();
    scale.set_property_value("Operation", "Add").unwrap();
    scale.set_property("OutputWorkspace", "pipe_async_out").unwrap();
    let fractions = Arc::new(Mutex::new(Vec::new()));
    let sink = fractions.clone();
    scale.observe(EventMask::PROGRESS, move |n| {
        if let AlgorithmEvent::Progress { fraction, .. } = n.event {
            sink.lock().push(fraction);
        }
    });

    let (_, result) = executor.wait(executor.execute_async(scale)).unwrap();
    result.unwrap();

    let seen = fractions.lock().clone();
    assert_eq!(seen.len(), 8);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert!(workspace("pipe_async_out").y().iter().all(|&v| (v - 1.5).abs() < 1e-12));
}

// =============================================================================
// C interface
// =============================================================================

fn c(text: &str) -> CString {
    CString::new(text).unwrap()
}

#[test]
fn test_ffi_round_trip() {
    unsafe {
        assert_eq!(rdx_framework_init(ptr::null()), RdxStatus::Ok);

        let mut alg: AlgorithmHandle = ptr::null_mut();
        assert_eq!(rdx_algorithm_create(c("CreateWorkspace").as_ptr(), 0, &mut alg), RdxStatus::Ok);

        let set = |name: &str, value: &str| rdx_algorithm_set_property(alg, c(name).as_ptr(), c(value).as_ptr());
        assert_eq!(set("DataY", "1,2,3,4"), RdxStatus::Ok);
        assert_eq!(set("NSpec", "0"), RdxStatus::ValidationFailed);
        assert_eq!(set("NSpec", "two"), RdxStatus::ParseError);
        assert_eq!(set("Missing", "1"), RdxStatus::NotFound);
        let message = CStr::from_ptr(rdx_last_error_message()).to_str().unwrap();
        assert!(message.contains("Missing"));

        assert_eq!(set("NSpec", "2"), RdxStatus::Ok);
        assert_eq!(set("OutputWorkspace", "pipe_ffi"), RdxStatus::Ok);
        assert_eq!(rdx_algorithm_execute(alg), RdxStatus::Ok);

        let mut buffer = [0 as std::ffi::c_char; 8];
        let mut len = 0usize;
        let status = rdx_algorithm_get_property(alg, c("DataY").as_ptr(), buffer.as_mut_ptr(), buffer.len(), &mut len);
        assert_eq!(status, RdxStatus::Ok);
        assert_eq!(CStr::from_ptr(buffer.as_ptr()).to_str().unwrap(), "1,2,3,4");

        let status = rdx_algorithm_get_property(alg, c("OutputWorkspace").as_ptr(), buffer.as_mut_ptr(), 4, &mut len);
        assert_eq!(status, RdxStatus::BufferTooSmall);
        assert_eq!(len, "pipe_ffi".len());
        assert_eq!(CStr::from_ptr(buffer.as_ptr()).to_str().unwrap(), "pip");

        rdx_algorithm_free(alg);

        let mut missing: AlgorithmHandle = ptr::null_mut();
        assert_eq!(rdx_algorithm_create(c("Nothing").as_ptr(), 0, &mut missing), RdxStatus::NotFound);
        assert!(missing.is_null());
    }
    assert_eq!(workspace("pipe_ffi").y().shape(), &[2, 2]);
}

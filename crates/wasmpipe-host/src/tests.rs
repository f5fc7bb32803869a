//! End-to-end tests running small WAT guests against in-memory channels.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use base64::Engine as _;
use wasmpipe_frame::{FrameConfig, FrameError};

use super::*;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl std::io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

const ECHO_GUEST: &str = r#"
(module
  (import "env" "read_pipe" (func $read_pipe (param i32) (result i32)))
  (import "env" "write_pipe" (func $write_pipe (param i32 i32)))
  (memory (export "memory") 1)
  (func (export "run") (param $seed i32)
    (call $write_pipe (i32.const 1024) (call $read_pipe (i32.const 1024)))))
"#;

fn quiet_host(config: HostConfig) -> WasmHost {
    WasmHost::new(config.capabilities(GuestCapabilities::none())).unwrap()
}

fn run_guest_with(
    config: HostConfig,
    wat: &str,
    inbound: &[u8],
    seed: i32,
) -> (Result<RunReport>, Vec<u8>) {
    let host = quiet_host(config);
    let bytes = wat::parse_str(wat).unwrap();
    let module = host.load_module_bytes("test-guest", &bytes).unwrap();

    let out = SharedBuffer::default();
    let session = PipeSession::new(
        Cursor::new(inbound.to_vec()),
        out.clone(),
        host.config().frame_config(),
    );
    let result = host
        .instantiate(&module, session)
        .and_then(|instance| instance.run(seed));
    (result, out.contents())
}

fn run_guest(wat: &str, inbound: &[u8]) -> (Result<RunReport>, Vec<u8>) {
    run_guest_with(HostConfig::default(), wat, inbound, 7)
}

#[test]
fn test_host_creation() {
    assert!(WasmHost::new(HostConfig::default()).is_ok());
}

#[test]
fn test_host_rejects_invalid_config() {
    let config = HostConfig {
        read_chunk_size: 0,
        ..HostConfig::default()
    };
    assert!(matches!(WasmHost::new(config), Err(HostError::Config(_))));
}

#[test]
fn test_echo_guest() {
    let (result, out) = run_guest(ECHO_GUEST, b"5,hello");
    let report = result.unwrap();

    assert_eq!(out, b"5,hello");
    assert_eq!(report.seed, 7);
    assert_eq!(report.frames_read, 1);
    assert_eq!(report.frames_written, 1);
}

#[test]
fn test_echo_empty_frame() {
    let (result, out) = run_guest(ECHO_GUEST, b"0,");
    result.unwrap();
    assert_eq!(out, b"0,");
}

#[test]
fn test_seed_reaches_guest() {
    let wat = r#"
    (module
      (import "env" "write_pipe" (func $write_pipe (param i32 i32)))
      (memory (export "memory") 1)
      (func (export "run") (param $seed i32)
        (i32.store (i32.const 0) (local.get $seed))
        (call $write_pipe (i32.const 0) (i32.const 4))))
    "#;

    let (result, out) = run_guest_with(HostConfig::default(), wat, b"", -123_456);
    assert_eq!(result.unwrap().seed, -123_456);

    let mut expected = b"4,".to_vec();
    expected.extend_from_slice(&(-123_456i32).to_le_bytes());
    assert_eq!(out, expected);
}

#[test]
fn test_guest_without_calls_succeeds() {
    let wat = r#"
    (module
      (memory (export "memory") 1)
      (func (export "run") (param i32)))
    "#;

    let (result, out) = run_guest(wat, b"");
    let report = result.unwrap();
    assert_eq!(report.frames_read, 0);
    assert_eq!(report.frames_written, 0);
    assert!(out.is_empty());
}

#[test]
fn test_back_to_back_frames() {
    let wat = r#"
    (module
      (import "env" "read_pipe" (func $read_pipe (param i32) (result i32)))
      (import "env" "write_pipe" (func $write_pipe (param i32 i32)))
      (memory (export "memory") 1)
      (func (export "run") (param $seed i32)
        (local $a i32)
        (local $b i32)
        (local.set $a (call $read_pipe (i32.const 0)))
        (local.set $b (call $read_pipe (i32.const 100)))
        (call $write_pipe (i32.const 100) (local.get $b))
        (call $write_pipe (i32.const 0) (local.get $a))))
    "#;

    let (result, out) = run_guest(wat, b"3,abc4,defg");
    let report = result.unwrap();
    assert_eq!(out, b"4,defg3,abc");
    assert_eq!(report.frames_read, 2);
    assert_eq!(report.frames_written, 2);
}

#[test]
fn test_read_after_memory_grow() {
    let wat = r#"
    (module
      (import "env" "read_pipe" (func $read_pipe (param i32) (result i32)))
      (import "env" "write_pipe" (func $write_pipe (param i32 i32)))
      (memory (export "memory") 1)
      (func (export "run") (param $seed i32)
        (drop (memory.grow (i32.const 1)))
        (call $write_pipe (i32.const 65546) (call $read_pipe (i32.const 65546)))))
    "#;

    let (result, out) = run_guest(wat, b"2,ok");
    result.unwrap();
    assert_eq!(out, b"2,ok");
}

#[test]
fn test_memory_limit_denies_growth() {
    let wat = r#"
    (module
      (import "env" "write_pipe" (func $write_pipe (param i32 i32)))
      (memory (export "memory") 1)
      (func (export "run") (param $seed i32)
        (i32.store (i32.const 0) (memory.grow (i32.const 4)))
        (call $write_pipe (i32.const 0) (i32.const 4))))
    "#;

    let config = HostConfig::default().max_memory(2 * 65536);
    let (result, out) = run_guest_with(config, wat, b"", 0);
    result.unwrap();

    let mut expected = b"4,".to_vec();
    expected.extend_from_slice(&(-1i32).to_le_bytes());
    assert_eq!(out, expected);
}

#[test]
fn test_read_out_of_bounds_traps() {
    let wat = r#"
    (module
      (import "env" "read_pipe" (func $read_pipe (param i32) (result i32)))
      (memory (export "memory") 1)
      (func (export "run") (param $seed i32)
        (drop (call $read_pipe (i32.const 65534)))))
    "#;

    let (result, out) = run_guest(wat, b"5,hello");
    match result {
        Err(HostError::Bridge(BridgeError::MemoryBounds { offset, len, size })) => {
            assert_eq!(offset, 65534);
            assert_eq!(len, 5);
            assert_eq!(size, 65536);
        }
        other => panic!("expected bounds error, got {:?}", other),
    }
    assert!(out.is_empty());
}

#[test]
fn test_negative_pointer_is_out_of_bounds() {
    let wat = r#"
    (module
      (import "env" "write_pipe" (func $write_pipe (param i32 i32)))
      (memory (export "memory") 1)
      (func (export "run") (param $seed i32)
        (call $write_pipe (i32.const -1) (i32.const 1))))
    "#;

    let (result, out) = run_guest(wat, b"");
    assert!(matches!(
        result,
        Err(HostError::Bridge(BridgeError::MemoryBounds { offset: 4_294_967_295, .. }))
    ));
    assert!(out.is_empty());
}

#[test]
fn test_write_out_of_bounds_traps() {
    let wat = r#"
    (module
      (import "env" "write_pipe" (func $write_pipe (param i32 i32)))
      (memory (export "memory") 1)
      (func (export "run") (param $seed i32)
        (call $write_pipe (i32.const 65000) (i32.const 1000))))
    "#;

    let (result, out) = run_guest(wat, b"");
    assert!(matches!(
        result,
        Err(HostError::Bridge(BridgeError::MemoryBounds { .. }))
    ));
    assert!(out.is_empty());
}

#[test]
fn test_large_write_under_default_config() {
    let wat = r#"
    (module
      (import "env" "write_pipe" (func $write_pipe (param i32 i32)))
      (memory (export "memory") 17)
      (func (export "run") (param $seed i32)
        (call $write_pipe (i32.const 0) (i32.const 1000001))))
    "#;

    let (result, out) = run_guest(wat, b"");
    assert_eq!(result.unwrap().frames_written, 1);
    assert!(out.starts_with(b"1000001,"));
    assert_eq!(out.len(), 8 + 1_000_001);
}

#[test]
fn test_inbound_bound_does_not_cap_writes() {
    let wat = r#"
    (module
      (import "env" "write_pipe" (func $write_pipe (param i32 i32)))
      (memory (export "memory") 1)
      (func (export "run") (param $seed i32)
        (call $write_pipe (i32.const 0) (i32.const 100))))
    "#;

    let config = HostConfig::default().max_frame_size(64);
    let (result, out) = run_guest_with(config, wat, b"", 0);
    result.unwrap();
    assert!(out.starts_with(b"100,"));
}

#[test]
fn test_configured_outbound_cap_traps() {
    let wat = r#"
    (module
      (import "env" "write_pipe" (func $write_pipe (param i32 i32)))
      (memory (export "memory") 1)
      (func (export "run") (param $seed i32)
        (call $write_pipe (i32.const 0) (i32.const 100))))
    "#;

    let config = HostConfig::default().max_outbound_frame_size(64);
    let (result, out) = run_guest_with(config, wat, b"", 0);
    assert!(matches!(
        result,
        Err(HostError::Bridge(BridgeError::Frame(
            FrameError::PayloadTooLarge { size: 100, max: 64 }
        )))
    ));
    assert!(out.is_empty());
}

#[test]
fn test_protocol_error_traps() {
    let (result, out) = run_guest(ECHO_GUEST, b"12a,hello");
    match result {
        Err(HostError::Bridge(err)) => assert!(err.is_protocol()),
        other => panic!("expected protocol error, got {:?}", other),
    }
    assert!(out.is_empty());
}

#[test]
fn test_closed_inbound_traps() {
    let (result, _) = run_guest(ECHO_GUEST, b"");
    assert!(matches!(
        result,
        Err(HostError::Bridge(BridgeError::Frame(FrameError::ConnectionClosed)))
    ));
}

#[test]
fn test_missing_memory() {
    let wat = r#"
    (module
      (import "env" "read_pipe" (func $read_pipe (param i32) (result i32)))
      (func (export "run") (param $seed i32)
        (drop (call $read_pipe (i32.const 0)))))
    "#;

    let (result, _) = run_guest(wat, b"2,hi");
    assert!(matches!(
        result,
        Err(HostError::Bridge(BridgeError::MissingMemory))
    ));
}

#[test]
fn test_missing_entry_point() {
    let wat = r#"
    (module
      (memory (export "memory") 1)
      (func (export "start") (param i32)))
    "#;

    let (result, _) = run_guest(wat, b"");
    assert!(matches!(result, Err(HostError::MissingExport(_))));
}

#[test]
fn test_wrong_entry_signature() {
    let wat = r#"
    (module
      (memory (export "memory") 1)
      (func (export "run")))
    "#;

    let (result, _) = run_guest(wat, b"");
    assert!(matches!(result, Err(HostError::MissingExport(_))));
}

#[test]
fn test_guest_trap() {
    let wat = r#"
    (module
      (memory (export "memory") 1)
      (func (export "run") (param i32)
        unreachable))
    "#;

    let (result, _) = run_guest(wat, b"");
    assert!(matches!(result, Err(HostError::GuestTrap(_))));
}

#[test]
fn test_unknown_import_fails_instantiation() {
    let wat = r#"
    (module
      (import "env" "peek_pipe" (func (param i32) (result i32)))
      (memory (export "memory") 1)
      (func (export "run") (param i32)))
    "#;

    let (result, _) = run_guest(wat, b"");
    assert!(matches!(result, Err(HostError::Engine(_))));
}

#[test]
fn test_proc_exit() {
    let wat = |code: i32| {
        format!(
            r#"
            (module
              (import "wasi_snapshot_preview1" "proc_exit" (func $exit (param i32)))
              (memory (export "memory") 1)
              (func (export "run") (param i32)
                (call $exit (i32.const {code}))))
            "#
        )
    };

    let (result, _) = run_guest(&wat(0), b"");
    assert!(result.is_ok());

    let (result, _) = run_guest(&wat(3), b"");
    assert!(matches!(result, Err(HostError::GuestExit(3))));
}

#[test]
fn test_load_module_base64() {
    let host = quiet_host(HostConfig::default());
    let bytes = wat::parse_str(ECHO_GUEST).unwrap();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

    // Wrapped the way an embedded blob usually is
    let wrapped: String = encoded
        .as_bytes()
        .chunks(60)
        .map(|line| format!("{}\n", std::str::from_utf8(line).unwrap()))
        .collect();

    let module = host.load_module_base64("embedded", &wrapped).unwrap();
    assert_eq!(module.name(), "embedded");
    assert!(module.has_entry_point());

    assert!(matches!(
        host.load_module_base64("bad", "!!not base64!!"),
        Err(HostError::ModuleEncoding(_))
    ));
}

#[test]
fn test_load_module_from_file() {
    let dir = std::env::temp_dir().join(format!("wasmpipe-host-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("echo_bot.wasm");
    std::fs::write(&path, wat::parse_str(ECHO_GUEST).unwrap()).unwrap();

    let host = quiet_host(HostConfig::default());
    let module = host.load_module(&path).unwrap();
    assert_eq!(module.name(), "echo_bot");

    assert!(matches!(
        host.load_module(dir.join("missing.wasm")),
        Err(HostError::Engine(_))
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_instance_memory_and_session() {
    let host = quiet_host(HostConfig::default());
    let module = host
        .load_module_bytes("echo", &wat::parse_str(ECHO_GUEST).unwrap())
        .unwrap();
    let session = PipeSession::new(
        Cursor::new(Vec::new()),
        SharedBuffer::default(),
        FrameConfig::default(),
    );

    let mut instance = host.instantiate(&module, session).unwrap();
    assert_eq!(instance.memory_size(), Some(65536));
    assert_eq!(instance.session().frames_read(), 0);
}

#[test]
fn test_random_seed_varies() {
    let seeds: Vec<i32> = (0..16).map(|_| random_seed()).collect();
    assert!(seeds.iter().any(|&s| s != seeds[0]));
}

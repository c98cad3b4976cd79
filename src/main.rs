//! CarPhone bridge firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │  UartTransport    MfbPin         ConfigStore  TickTimer  │
//! │  (Transport)      (FlowControl)  (Config)     (1 kHz)    │
//! │                                                          │
//! │  ──────────────── Port Trait Boundary ───────────────    │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │  Bridge: decoder · dispatcher · send engine · AT   │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                        LogTelephony                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use carphone::adapters::config_store::ConfigStore;
use carphone::adapters::log_handler::LogTelephony;
use carphone::adapters::mfb::MfbPin;
use carphone::adapters::uart::UartTransport;
use carphone::app::ports::{ConfigError, ConfigPort};
use carphone::bridge::Bridge;
use carphone::config::BridgeConfig;
use carphone::drivers::hw_timer::TickTimer;
use carphone::pins;
use carphone::timer::BridgeTimers;

/// Ticked by the esp_timer task, read by the main loop.
static TIMERS: BridgeTimers = BridgeTimers::new();

/// Log bridge counters every this many loop iterations (~1 ms each).
const STATS_INTERVAL: u32 = 60_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("CarPhone bridge v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Load config (or defaults) ──────────────────────────
    let mut store = match ConfigStore::new() {
        Ok(s) => s,
        Err(e) => {
            warn!("NVS init failed ({}), running without persistence", e);
            ConfigStore::default()
        }
    };
    let config = match store.load() {
        Ok(cfg) => cfg,
        Err(ConfigError::NotFound) => {
            info!("No stored config, writing defaults");
            let cfg = BridgeConfig::default();
            if let Err(e) = store.save(&cfg) {
                warn!("Config save failed: {}", e);
            }
            cfg
        }
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            BridgeConfig::default()
        }
    };

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    // SAFETY: pin numbers come from `pins` and are not claimed elsewhere.
    let (tx, rx, mfb, reset) = unsafe {
        (
            AnyIOPin::new(pins::BT_UART_TX_GPIO),
            AnyIOPin::new(pins::BT_UART_RX_GPIO),
            AnyOutputPin::new(pins::BT_MFB_GPIO),
            AnyOutputPin::new(pins::BT_RESET_GPIO),
        )
    };

    let mut reset = PinDriver::output(reset)?;
    reset.set_high()?;

    let uart = UartDriver::new(
        peripherals.uart1,
        tx,
        rx,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(config.uart_baud)),
    )?;
    let mfb = MfbPin::new(PinDriver::output(mfb)?);

    // ── 4. Bridge ─────────────────────────────────────────────
    let _tick = TickTimer::start(&TIMERS)?;
    let mut bridge = Bridge::new(
        &config,
        &TIMERS,
        UartTransport::new(uart),
        mfb,
        LogTelephony::new(),
    )?;
    bridge.set_unsolicited_handler(LogTelephony::log_unsolicited);

    if let Err(e) = bridge.set_device_name(&config.device_name) {
        warn!("Cannot queue device name: {}", e);
    }
    if let Err(e) = bridge.read_version() {
        warn!("Cannot queue version read: {}", e);
    }
    if let Err(e) = bridge.link_back() {
        warn!("Cannot queue link back: {}", e);
    }
    // Signal, battery and call indicators once the phone has linked back.
    if let Err(e) = bridge.at_send("+CIND?", Some(LogTelephony::log_at_response)) {
        warn!("Cannot queue indicator query: {}", e);
    }

    info!("Bridge ready. Entering main loop.");

    // ── 5. Main loop ──────────────────────────────────────────
    let mut iterations: u32 = 0;
    loop {
        bridge.poll();
        bridge.pump_tx();

        iterations = iterations.wrapping_add(1);
        if iterations % STATS_INTERVAL == 0 {
            info!("STATS | {:?}", bridge.stats());
        }

        FreeRtos::delay_ms(1);
    }
}

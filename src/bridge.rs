//! Bridge service.
//!
//! [`Bridge`] owns the frame decoder, event dispatcher, send engine and AT
//! subsystem, and the telephony handler they all report to.  The main loop
//! calls [`Bridge::poll`] once per millisecond tick; everything else is a
//! command entry point for the telephone/UI layer.
//!
//! ```text
//!   Transport ──▶ FrameDecoder ──▶ Dispatcher ──▶ TelephonyHandler
//!       ▲                              │   │
//!       │                              ▼   ▼
//!       └───────── SendEngine ◀──── AtSubsystem
//! ```

use log::{debug, info, warn};

use crate::app::ports::{FlowControl, TelephonyHandler, Transport};
use crate::at::{AtCallback, AtSubsystem, UnsolicitedHandler};
use crate::config::BridgeConfig;
use crate::engine::dispatch::{self, DispatchStats, Dispatcher};
use crate::engine::send::{Origin, SendEngine, SendStats};
use crate::error::{Error, Result, SendError};
use crate::protocol::codec::FrameDecoder;
use crate::protocol::commands::{self, Command};
use crate::protocol::ids::mmi;
use crate::timer::BridgeTimers;

/// Bytes read from the transport per read call.
const RX_CHUNK: usize = 64;

/// Counters gathered from every stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Frames discarded for a bad checksum.
    pub dropped_frames: u32,
    pub dispatch: DispatchStats,
    pub send: SendStats,
    /// Transport read failures.
    pub rx_errors: u32,
}

pub struct Bridge<'t, H, T, F>
where
    H: TelephonyHandler,
    T: Transport,
    F: FlowControl,
{
    decoder: FrameDecoder,
    dispatcher: Dispatcher,
    send: SendEngine<'t, T, F>,
    at: AtSubsystem<'t, H>,
    handler: H,
    link: u8,
    rx_errors: u32,
}

impl<'t, H, T, F> Bridge<'t, H, T, F>
where
    H: TelephonyHandler,
    T: Transport,
    F: FlowControl,
{
    /// Build the bridge.  `timers` must be ticked every millisecond by the
    /// platform timer for the lifetime of the bridge.
    pub fn new(
        config: &BridgeConfig,
        timers: &'t BridgeTimers,
        transport: T,
        mfb: F,
        handler: H,
    ) -> Result<Self> {
        config.validate().map_err(Error::Config)?;
        info!(
            "bridge: link {} ack timeout {} ms, at timeout {} ms",
            config.link_index, config.ack_timeout_ms, config.at_response_timeout_ms
        );
        Ok(Self {
            decoder: FrameDecoder::new(),
            dispatcher: Dispatcher::new(),
            send: SendEngine::new(transport, mfb, &timers.send, config),
            at: AtSubsystem::new(
                &timers.at,
                config.at_response_timeout_ms,
                config.link_index,
            ),
            handler,
            link: config.link_index,
            rx_errors: 0,
        })
    }

    // ── Per-tick work ─────────────────────────────────────────

    /// Drain received bytes, then advance the send engine and AT subsystem.
    pub fn poll(&mut self) {
        let mut buf = [0u8; RX_CHUNK];
        while self.send.transport().available() {
            match self.send.transport_mut().read(&mut buf) {
                Ok(0) => break,
                Ok(n) => self.receive(&buf[..n]),
                Err(e) => {
                    self.rx_errors = self.rx_errors.wrapping_add(1);
                    warn!("bridge: UART read failed: {:?}", e);
                    break;
                }
            }
        }

        if let Some(outcome) = self.send.poll() {
            dispatch::route_outcome(&outcome, &mut self.at, &mut self.handler);
        }
        self.at.poll(&mut self.send, &mut self.handler);
    }

    /// Feed received bytes through the decoder, dispatching each complete
    /// frame before the next byte is consumed.
    pub fn receive(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if let Some(payload) = self.decoder.push(b) {
                self.dispatcher
                    .dispatch(payload, &mut self.send, &mut self.at, &mut self.handler);
            }
        }
    }

    /// UART transmit-complete interrupt.
    pub fn on_tx_complete(&mut self) {
        self.send.on_tx_complete();
    }

    /// Push out the in-flight frame on drivers without a per-byte interrupt.
    pub fn pump_tx(&mut self) {
        self.send.pump_tx();
    }

    // ── Raw commands ──────────────────────────────────────────

    /// Queue a pre-encoded command payload on behalf of the local layer.
    pub fn send(&mut self, payload: &[u8]) -> core::result::Result<(), SendError> {
        self.send.send(payload, Origin::Local)
    }

    /// Relay a payload from an external host.  Its outcome is only logged.
    pub fn forward(&mut self, payload: &[u8]) -> core::result::Result<(), SendError> {
        debug!("bridge: forwarding {} bytes", payload.len());
        self.send.send(payload, Origin::Forwarded)
    }

    pub fn command(&mut self, command: Command<'_>) -> Result<()> {
        let payload = command.encode()?;
        self.send.send(&payload, Origin::Local)?;
        Ok(())
    }

    fn mmi(&mut self, action: u8) -> Result<()> {
        self.command(Command::Mmi {
            link: self.link,
            action,
        })
    }

    // ── Call control ──────────────────────────────────────────

    pub fn make_call(&mut self, digits: &str) -> Result<()> {
        info!("bridge: dialling {}", digits);
        self.command(Command::MakeCall {
            link: self.link,
            digits,
        })
    }

    pub fn accept_call(&mut self) -> Result<()> {
        self.mmi(mmi::ACCEPT_CALL)
    }

    pub fn reject_call(&mut self) -> Result<()> {
        self.mmi(mmi::REJECT_CALL)
    }

    pub fn end_call(&mut self) -> Result<()> {
        self.mmi(mmi::END_CALL)
    }

    pub fn redial(&mut self) -> Result<()> {
        self.mmi(mmi::LAST_NUMBER_REDIAL)
    }

    pub fn voice_dial(&mut self) -> Result<()> {
        self.mmi(mmi::VOICE_DIAL)
    }

    pub fn set_mic_mute(&mut self, muted: bool) -> Result<()> {
        self.mmi(commands::mic_mute_action(muted))
    }

    pub fn volume_up(&mut self) -> Result<()> {
        self.mmi(mmi::VOLUME_UP)
    }

    pub fn volume_down(&mut self) -> Result<()> {
        self.mmi(mmi::VOLUME_DOWN)
    }

    /// Ask the phone for its call list; results arrive as `+CLCC` lines
    /// through the unsolicited handler.
    pub fn query_call_list(&mut self) -> Result<()> {
        self.mmi(mmi::QUERY_CALL_LIST)
    }

    // ── Module control ────────────────────────────────────────

    pub fn enter_pairing(&mut self) -> Result<()> {
        self.mmi(mmi::ENTER_PAIRING)
    }

    pub fn exit_pairing(&mut self) -> Result<()> {
        self.mmi(mmi::EXIT_PAIRING)
    }

    /// Simulated power-button press and release.
    pub fn power_on(&mut self) -> Result<()> {
        self.mmi(mmi::POWER_ON_PRESS)?;
        self.mmi(mmi::POWER_ON_RELEASE)
    }

    pub fn power_off(&mut self) -> Result<()> {
        self.mmi(mmi::POWER_OFF_PRESS)?;
        self.mmi(mmi::POWER_OFF_RELEASE)
    }

    pub fn set_device_name(&mut self, name: &str) -> Result<()> {
        self.command(Command::ChangeDeviceName(name))
    }

    pub fn read_version(&mut self) -> Result<()> {
        self.command(Command::ReadBtmVersion)
    }

    pub fn read_link_status(&mut self) -> Result<()> {
        self.command(Command::ReadLinkStatus)
    }

    pub fn read_local_address(&mut self) -> Result<()> {
        self.command(Command::ReadLocalBdAddress)
    }

    pub fn read_local_name(&mut self) -> Result<()> {
        self.command(Command::ReadLocalDeviceName)
    }

    pub fn link_back(&mut self) -> Result<()> {
        self.command(Command::LinkBack)
    }

    pub fn disconnect(&mut self, flags: u8) -> Result<()> {
        self.command(Command::Disconnect { flags })
    }

    // ── AT commands ───────────────────────────────────────────

    pub fn at_send(&mut self, text: &str, callback: Option<AtCallback<H>>) -> Result<()> {
        self.at.send(text, callback)?;
        Ok(())
    }

    pub fn at_send_dtmf(&mut self, digit: char, callback: Option<AtCallback<H>>) -> Result<()> {
        self.at.send_dtmf(digit, callback)?;
        Ok(())
    }

    pub fn set_unsolicited_handler(&mut self, handler: UnsolicitedHandler<H>) {
        self.at.set_unsolicited_handler(handler);
    }

    // ── Lifecycle / inspection ────────────────────────────────

    /// Forget all queued work, e.g. after the module was reset.
    pub fn reset(&mut self) {
        warn!("bridge: reset, dropping {} queued commands", self.send.pending());
        self.decoder.reset();
        self.send.reset();
        self.at.reset();
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            dropped_frames: self.decoder.dropped_frames(),
            dispatch: self.dispatcher.stats(),
            send: self.send.stats(),
            rx_errors: self.rx_errors,
        }
    }

    pub fn send_engine(&self) -> &SendEngine<'t, T, F> {
        &self.send
    }

    pub fn at(&self) -> &AtSubsystem<'t, H> {
        &self.at
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn transport(&self) -> &T {
        self.send.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.send.transport_mut()
    }
}

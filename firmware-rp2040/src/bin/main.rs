#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{Config as UartConfig, Uart, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Delay, Duration, Ticker};
use gimbal_tracker_rp2040::{
    CameraInput, ControlCommand, GimbalConfig, GimbalController, MotorDriver, TargetMailbox,
    TargetReceiver, UartMotorLink,
};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART0_IRQ => embassy_rp::uart::InterruptHandler<UART0>;
});

/// Latest target sample, written by the camera task and taken by the control task.
static MAILBOX: TargetMailbox = TargetMailbox::new();

/// Operator commands for the control task.
static COMMANDS: Channel<CriticalSectionRawMutex, ControlCommand, 4> = Channel::new();

/// Log every Nth tracking record.
const TELEMETRY_EVERY: u32 = 10;

type Controller =
    GimbalController<'static, UartMotorLink<'static>, UartMotorLink<'static>, Delay>;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Gimbal tracker starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());
    let config = GimbalConfig::default();

    // --- UART Setup ---
    // UART0 carries the camera (RX) and the tilt motor (TX); the pan motor
    // gets UART1 TX to itself.
    let uart0 = Uart::new(
        p.UART0,
        p.PIN_0, // TX: tilt motor
        p.PIN_1, // RX: camera
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config(),
    );
    let (tilt_tx, camera_rx) = uart0.split();
    let pan_tx = UartTx::new(p.UART1, p.PIN_4, p.DMA_CH2, uart_config());

    let camera = CameraInput::new(camera_rx, TargetReceiver::new(config.frame, &MAILBOX));

    let motors = MotorDriver::new(
        UartMotorLink::new(pan_tx),
        UartMotorLink::new(tilt_tx),
        Delay,
        config.motor,
    );
    let gimbal = GimbalController::new(&MAILBOX, motors, config);

    spawner.spawn(camera_task(camera)).unwrap();
    spawner.spawn(control_task(gimbal)).unwrap();

    info!("Gimbal tracker initialized, waiting for targets...");
}

fn uart_config() -> UartConfig {
    let mut config = UartConfig::default();
    config.baudrate = 115_200;
    config
}

/// Camera task - feeds sensor bytes into the mailbox.
#[embassy_executor::task]
async fn camera_task(mut camera: CameraInput<'static>) {
    camera.run().await;
}

/// Control task - powers the motors, then ticks the controller at a fixed
/// rate and applies operator commands in between.
#[embassy_executor::task]
async fn control_task(mut gimbal: Controller) {
    if let Err(e) = gimbal.power_on().await {
        error!("Motor power-up failed: {:?}", e);
    }

    #[cfg(feature = "track-on-boot")]
    COMMANDS.send(ControlCommand::Enable).await;

    let period = Duration::from_millis(gimbal.config().tick_period_ms());
    let mut ticker = Ticker::every(period);
    let mut records: u32 = 0;

    loop {
        match select(ticker.next(), COMMANDS.receive()).await {
            Either::First(()) => {
                let Some(t) = gimbal.tick().await else {
                    continue;
                };
                if records % TELEMETRY_EVERY == 0 {
                    info!(
                        "Track: pos=[{},{}] delta=[{},{}] pid=[{},{}] {:?}",
                        t.target_x, t.target_y, t.dx, t.dy, t.output_h, t.output_v, t.state
                    );
                }
                records = records.wrapping_add(1);
            }
            Either::Second(command) => {
                info!("Command: {:?}", command);
                if let Err(e) = gimbal.apply(command).await {
                    warn!("Command {:?} failed: {:?}", command, e);
                }
                // Self test and speed-mode moves can outlast many periods.
                // Missed ticks are dropped, not replayed.
                ticker.reset();
            }
        }
    }
}

//! Motor actuators for the two drive sides.
//!
//! Each side has a single direction-select line and a proportional speed
//! line, so only forward-drive and backward-drive are reachable. Writes are
//! fire-and-forget: a `MotorDriver` never reports failure to the control loop.

use core::cell::RefCell;

use embedded_hal::{digital::OutputPin, i2c::I2c, pwm::SetDutyCycle};
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};

use crate::utils::{
    config::PwmConfig,
    math::mixer::{clamp_speed, Direction, DriveCommand, MotorCommand, MotorSide, MAX_SPEED},
};

/// Sink for per-motor speed and direction commands.
pub trait MotorDriver {
    /// Drive `side` at `speed` (re-clamped to `[0, 255]`) in `direction`.
    fn set_motor(
        &mut self,
        side: MotorSide,
        speed: i32,
        direction: Direction,
    );

    /// Write both sides of a mixed command, A first.
    fn apply(
        &mut self,
        command: &DriveCommand,
    ) {
        self.set_motor(MotorSide::A, command.a.speed as i32, command.a.direction);
        self.set_motor(MotorSide::B, command.b.speed as i32, command.b.direction);
    }

    /// Bring both sides to zero speed.
    fn stop(&mut self) {
        self.apply(&DriveCommand::STOPPED);
    }
}

impl<T: MotorDriver + ?Sized> MotorDriver for &mut T {
    fn set_motor(
        &mut self,
        side: MotorSide,
        speed: i32,
        direction: Direction,
    ) {
        (**self).set_motor(side, speed, direction)
    }
}

/// One side driven by a GPIO direction line and a PWM speed output.
pub struct PinMotor<Dir, Pwm> {
    dir: Dir,
    pwm: Pwm,
}

impl<Dir, Pwm> PinMotor<Dir, Pwm>
where
    Dir: OutputPin,
    Pwm: SetDutyCycle,
{
    pub fn new(
        dir: Dir,
        pwm: Pwm,
    ) -> Self {
        PinMotor { dir, pwm }
    }

    fn drive(
        &mut self,
        speed: u8,
        direction: Direction,
    ) {
        let level = if direction.is_high() {
            self.dir.set_high()
        } else {
            self.dir.set_low()
        };
        if let Err(e) = level {
            tracing::error!("direction line write failed: {:?}", e);
        }
        if let Err(e) = self
            .pwm
            .set_duty_cycle_fraction(speed as u16, MAX_SPEED as u16)
        {
            tracing::error!("speed PWM write failed: {:?}", e);
        }
    }

    /// Release the direction pin and PWM output.
    pub fn release(self) -> (Dir, Pwm) {
        (self.dir, self.pwm)
    }
}

/// Both sides wired straight to MCU pins.
pub struct PinMotors<DA, PA, DB, PB> {
    pub a: PinMotor<DA, PA>,
    pub b: PinMotor<DB, PB>,
}

impl<DA, PA, DB, PB> PinMotors<DA, PA, DB, PB> {
    pub fn new(
        a: PinMotor<DA, PA>,
        b: PinMotor<DB, PB>,
    ) -> Self {
        PinMotors { a, b }
    }
}

impl<DA, PA, DB, PB> MotorDriver for PinMotors<DA, PA, DB, PB>
where
    DA: OutputPin,
    PA: SetDutyCycle,
    DB: OutputPin,
    PB: SetDutyCycle,
{
    fn set_motor(
        &mut self,
        side: MotorSide,
        speed: i32,
        direction: Direction,
    ) {
        let speed = clamp_speed(speed);
        match side {
            MotorSide::A => self.a.drive(speed, direction),
            MotorSide::B => self.b.drive(speed, direction),
        }
    }
}

/// Errors that can occur while bringing up the PCA9685 motor board.
#[derive(Debug)]
pub enum DeviceError<E: core::fmt::Debug> {
    PwmError(PwmError<E>),
    PwmNotInitialized,
}

/// Both motors on a PCA9685 sharing an I2C bus.
///
/// Per side, the first channel is held fully on or fully off as the direction
/// line and the second carries the speed duty.
pub struct PwmMotors<'a, I2C: 'static> {
    i2c: &'a RefCell<I2C>,
    pub pwm: Option<Pca9685<RefCellDevice<'a, I2C>>>,
    motor_channels: [(Channel, Channel); 2],
    config: PwmConfig,
}

impl<'a, I2C, E> PwmMotors<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    /// Full-scale 12-bit duty.
    pub const MAX_DUTY: u16 = 4095;

    /// Create a driver for the board described by `config`; no bus traffic.
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        config: PwmConfig,
    ) -> Self {
        PwmMotors {
            i2c: i2c_bus,
            pwm: None,
            motor_channels: [(Channel::C0, Channel::C1), (Channel::C2, Channel::C3)],
            config,
        }
    }

    /// Attach the PCA9685 at the configured address.
    pub fn init_device(&mut self) -> Result<(), DeviceError<E>> {
        let pwm = Pca9685::new(
            RefCellDevice::new(self.i2c),
            PwmAddress::from(self.config.address),
        )
        .map_err(DeviceError::PwmError)?;
        self.pwm = Some(pwm);
        Ok(())
    }

    /// Scan the I2C bus for devices and log any found addresses.
    pub fn scan_bus(&self) {
        let mut bus = self.i2c.borrow_mut();
        for addr in 0x03..0x78 {
            if bus.write(addr, &[]).is_ok() {
                tracing::warn!("I2C device found at 0x{:02X}", addr);
            }
        }
    }

    /// Enable the outputs and set the prescaler.
    pub fn configure_pwm(&mut self) -> Result<(), DeviceError<E>> {
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        pca.enable().map_err(DeviceError::PwmError)?;
        tracing::info!("PWM enabled");
        pca.set_prescale(self.config.prescale)
            .map_err(DeviceError::PwmError)?;
        tracing::info!(prescale = self.config.prescale, "PWM prescale set");
        Ok(())
    }

    /// Wake the PCA9685 oscillator.
    pub fn enable(&mut self) -> Result<(), DeviceError<E>> {
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        pca.enable().map_err(DeviceError::PwmError)
    }

    /// Put the PCA9685 to sleep; all outputs go idle.
    pub fn disable(&mut self) -> Result<(), DeviceError<E>> {
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;
        pca.disable().map_err(DeviceError::PwmError)
    }

    /// Write one side's direction and speed channels.
    pub fn write_side(
        &mut self,
        side: MotorSide,
        command: MotorCommand,
    ) -> Result<(), DeviceError<E>> {
        let (phase_channel, enable_channel) = match side {
            MotorSide::A => self.motor_channels[0],
            MotorSide::B => self.motor_channels[1],
        };
        let duty = (command.speed as u32 * Self::MAX_DUTY as u32 / MAX_SPEED as u32) as u16;
        let pca = self.pwm.as_mut().ok_or(DeviceError::PwmNotInitialized)?;

        // Full-off takes precedence over full-on, so going high clears it.
        if command.direction.is_high() {
            pca.set_channel_full_on(phase_channel, 0)
                .map_err(DeviceError::PwmError)?;
            pca.set_channel_off(phase_channel, 0)
                .map_err(DeviceError::PwmError)?;
        } else {
            pca.set_channel_full_off(phase_channel)
                .map_err(DeviceError::PwmError)?;
        }
        pca.set_channel_on_off(enable_channel, 0, duty)
            .map_err(DeviceError::PwmError)
    }

    /// Attach and configure the board, falling back to a logging driver when
    /// it does not answer.
    pub fn init_or_dry_run(
        i2c_bus: &'a RefCell<I2C>,
        config: PwmConfig,
    ) -> MotorBackend<Self> {
        let mut motors = PwmMotors::new(i2c_bus, config);
        match motors.init_device().and_then(|()| motors.configure_pwm()) {
            Ok(()) => MotorBackend::Hardware(motors),
            Err(e) => {
                tracing::warn!("PWM init failed, scanning instead: {:?}", e);
                motors.scan_bus();
                MotorBackend::DryRun(DryRunMotors::new())
            }
        }
    }
}

impl<I2C, E> MotorDriver for PwmMotors<'_, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    fn set_motor(
        &mut self,
        side: MotorSide,
        speed: i32,
        direction: Direction,
    ) {
        if let Err(e) = self.write_side(side, MotorCommand::new(speed, direction)) {
            tracing::error!(?side, "motor write failed: {:?}", e);
        }
    }
}

/// Driver used when no motor hardware is present: it logs and remembers the
/// last command for each side.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunMotors {
    last: [MotorCommand; 2],
}

impl DryRunMotors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last command written to `side`.
    pub fn last(
        &self,
        side: MotorSide,
    ) -> MotorCommand {
        match side {
            MotorSide::A => self.last[0],
            MotorSide::B => self.last[1],
        }
    }
}

impl MotorDriver for DryRunMotors {
    fn set_motor(
        &mut self,
        side: MotorSide,
        speed: i32,
        direction: Direction,
    ) {
        let command = MotorCommand::new(speed, direction);
        tracing::info!(?side, speed = command.speed, ?direction, "(dry-run) motor");
        match side {
            MotorSide::A => self.last[0] = command,
            MotorSide::B => self.last[1] = command,
        }
    }
}

/// Real hardware when it answered at start-up, otherwise a dry run.
pub enum MotorBackend<M> {
    Hardware(M),
    DryRun(DryRunMotors),
}

impl<M> MotorBackend<M> {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, MotorBackend::DryRun(_))
    }
}

impl<M: MotorDriver> MotorDriver for MotorBackend<M> {
    fn set_motor(
        &mut self,
        side: MotorSide,
        speed: i32,
        direction: Direction,
    ) {
        match self {
            MotorBackend::Hardware(m) => m.set_motor(side, speed, direction),
            MotorBackend::DryRun(m) => m.set_motor(side, speed, direction),
        }
    }
}

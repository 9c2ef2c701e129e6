//! Mode indicator for the RC rover.
//!
//! The indicator is on while Spin mode is active and off otherwise. It can be
//! a single GPIO LED (`PinIndicator`) or an addressable strip driven through
//! `SmartLedsWrite` (`LedModule`).

use embedded_hal::digital::OutputPin;
use smart_leds_trait::{SmartLedsWrite, RGB8};

/// Number of LEDs in the attached chain.
const LED_COUNT: usize = 2;

/// Binary output signalling the active drive mode.
pub trait Indicator {
    fn set_active(
        &mut self,
        on: bool,
    );
}

impl<T: Indicator + ?Sized> Indicator for &mut T {
    fn set_active(
        &mut self,
        on: bool,
    ) {
        (**self).set_active(on)
    }
}

/// No indicator fitted.
impl Indicator for () {
    fn set_active(
        &mut self,
        _on: bool,
    ) {
    }
}

/// Indicator LED on a single output pin, active high.
pub struct PinIndicator<P> {
    pin: P,
}

impl<P: OutputPin> PinIndicator<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> Indicator for PinIndicator<P> {
    fn set_active(
        &mut self,
        on: bool,
    ) {
        let res = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(e) = res {
            tracing::error!("indicator write failed: {:?}", e);
        }
    }
}

/// Addressable LED strip lit in one colour while active.
///
/// Remembers the last written state and skips writes that would not change
/// the strip.
pub struct LedModule<Driver> {
    driver: Driver,
    color: RGB8,
    is_on: Option<bool>,
}

impl<Driver, E> LedModule<Driver>
where
    Driver: SmartLedsWrite<Color = RGB8, Error = E>,
    E: core::fmt::Debug,
{
    /// Create a `LedModule` that shows `color` when active.
    ///
    /// The first `set_active` call always writes the strip.
    pub fn new(
        driver: Driver,
        color: RGB8,
    ) -> Self {
        Self {
            driver,
            color,
            is_on: None,
        }
    }

    /// Whether the strip is currently lit, if it has been written yet.
    pub fn is_on(&self) -> Option<bool> {
        self.is_on
    }

    /// Release the underlying LED driver.
    pub fn release(self) -> Driver {
        self.driver
    }

    /// Set all LEDs in the strip to the specified color.
    fn set_all(
        &mut self,
        color: RGB8,
    ) -> Result<(), E> {
        let data = core::iter::repeat(color).take(LED_COUNT);
        self.driver.write(data)
    }
}

impl<Driver, E> Indicator for LedModule<Driver>
where
    Driver: SmartLedsWrite<Color = RGB8, Error = E>,
    E: core::fmt::Debug,
{
    fn set_active(
        &mut self,
        on: bool,
    ) {
        if self.is_on == Some(on) {
            return;
        }
        let color = if on { self.color } else { RGB8 { r: 0, g: 0, b: 0 } };
        match self.set_all(color) {
            Ok(()) => self.is_on = Some(on),
            Err(e) => tracing::error!("LED strip write failed: {:?}", e),
        }
    }
}

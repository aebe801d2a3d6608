#![no_std]
#![no_main]

#[cfg(target_os = "linux")]
mod linux {
    extern crate std;

    #[no_mangle]
    pub const extern "C" fn main() {}
}

#[cfg(not(any(target_os = "linux", target_os = "none")))]
mod other {
    extern crate std;
    use std::println;
    #[no_mangle]
    pub extern "C" fn main() {
        loop {
            println!("unsupported target");
        }
    }
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod arm {
    use defmt::*;
    use defmt_rtt as _;
    use embedded_hal::delay::DelayNs;
    use fugit::RateExtU32;
    use panic_probe as _;
    use rp2040_hal::{
        clocks::init_clocks_and_plls,
        entry,
        gpio::{FunctionI2C, Pin, Pins, PullUp},
        i2c::I2C,
        pac,
        sio::Sio,
        watchdog::Watchdog,
        Timer,
    };
    use veml7700_autorange::veml7700::{auto_range::Policy, DEFAULT_ADDRESS};
    use veml7700_autorange::{DriverUsingDelay, Error, Veml7700};

    #[link_section = ".boot2"]
    #[used]
    pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

    #[entry]
    fn main() -> ! {
        let mut pac = pac::Peripherals::take().unwrap();
        let mut watchdog = Watchdog::new(pac.WATCHDOG);
        let sio = Sio::new(pac.SIO);

        let external_xtal_freq_hz = 12_000_000u32;
        let clocks = init_clocks_and_plls(
            external_xtal_freq_hz,
            pac.XOSC,
            pac.CLOCKS,
            pac.PLL_SYS,
            pac.PLL_USB,
            &mut pac.RESETS,
            &mut watchdog,
        )
        .ok()
        .unwrap();

        let pins = Pins::new(
            pac.IO_BANK0,
            pac.PADS_BANK0,
            sio.gpio_bank0,
            &mut pac.RESETS,
        );
        let sda: Pin<_, FunctionI2C, PullUp> = pins.gpio8.reconfigure();
        let scl: Pin<_, FunctionI2C, PullUp> = pins.gpio9.reconfigure();

        let i2c = I2C::i2c0(
            pac.I2C0,
            sda,
            scl,
            400.kHz(),
            &mut pac.RESETS,
            &clocks.system_clock,
        );
        let mut timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

        let mut veml = Veml7700::new(i2c, DEFAULT_ADDRESS, timer)
            .unwrap()
            .init()
            .unwrap()
            .with_policy(Policy::OneShot);

        for _ in 0..5 {
            match veml.read_lux_one_shot() {
                Ok(lux) => println!("{} lux", lux),
                Err(Error::TooBright) => println!("too bright"),
                Err(_) => println!("no reading"),
            }
        }

        let mut veml = veml.with_policy(Policy::Incremental { correction: true });
        loop {
            let reading = veml.read_auto().unwrap();
            println!("{} lux", reading.lux);
            let wait = veml.setting().integration_time.millis() + 20;
            timer.delay_ms(wait);
        }
    }
}

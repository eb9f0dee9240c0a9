mod config;

use crate::config::Config;
use dotenv::dotenv;
use hd44780_gpio::delay::StdDelay;
use hd44780_gpio::gpiod::GpiodDriver;
use hd44780_gpio::lcd::hd44780::{
    BitWidth, Display, ExpanderHD44780Link, GpioHD44780Link, HD44780Link, PinAssignment,
    DEFAULT_EXPANDER_ADDRESS,
};
use hd44780_gpio::GpioDriver;
use log::{debug, info};
use std::env::var;
use std::thread;
use std::time::Duration;
use sysinfo::System;

fn parse_pin_bus<const N: usize>(pin_str: &str) -> eyre::Result<[usize; N]> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?
        .try_into()
        .map_err(|_| eyre::eyre!("Expected {} data pins", N))
}

/// Parses a decimal or `0x`-prefixed hexadecimal number.
fn parse_number(s: &str) -> eyre::Result<u8> {
    let s = s.trim();
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16)?,
        None => s.parse()?,
    };
    Ok(value)
}

fn optional_pin(name: &str) -> eyre::Result<Option<usize>> {
    match var(name) {
        Ok(s) if !s.trim().is_empty() => Ok(Some(s.trim().parse()?)),
        _ => Ok(None),
    }
}

fn load_config() -> eyre::Result<Config> {
    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };
    debug!("{:?}", config);
    Ok(config)
}

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "Hello, {}!",
        System::name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!(
        "System ver {} kernel ver {}",
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );
    info!(
        "Hostname {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!("Architecture {}", System::cpu_arch());

    let config = load_config()?;

    let transport = var("HD44780_TRANSPORT").unwrap_or_else(|_| "i2c".to_string());
    match transport.as_str() {
        "i2c" => run_i2c(&config),
        "gpio" => run_gpio(&config),
        other => Err(eyre::eyre!("Unknown transport {:?}, expected i2c or gpio", other)),
    }
}

fn run_i2c(config: &Config) -> eyre::Result<()> {
    let bus = match var("HD44780_I2C_BUS") {
        Ok(s) => parse_number(&s)?,
        Err(_) => 1,
    };
    let address = match var("HD44780_I2C_ADDRESS") {
        Ok(s) => parse_number(&s)?,
        Err(_) => DEFAULT_EXPANDER_ADDRESS,
    };
    info!("LCD @ I2C bus {}, address {:#04x}", bus, address);

    debug!("Opening I2C bus...");
    let i2c = rppal::i2c::I2c::with_bus(bus)?;

    let link = ExpanderHD44780Link::new(i2c, address, PinAssignment::PCF8574, StdDelay)?;
    debug!("{:?} created.", link);

    let mut lcd = Display::new(link, config.display)?;
    demo(&mut lcd, config)
}

fn run_gpio(config: &Config) -> eyre::Result<()> {
    let chip = var("HD44780_GPIO_CHIP").unwrap_or_else(|_| "/dev/gpiochip0".to_string());
    let e_pin_no: usize = var("HD44780_PIN_E")?.parse()?;
    let rs_pin_no: usize = var("HD44780_PIN_RS")?.parse()?;
    let rw_pin_no = optional_pin("HD44780_PIN_RW")?;
    let backlight_pin_no = optional_pin("HD44780_PIN_BACKLIGHT")?;
    let data_pin_str = var("HD44780_PINS_DATA")?;

    info!(
        "LCD @ {} E: {}, RS: {}, RW: {:?}, Backlight: {:?}, Data: {}",
        chip, e_pin_no, rs_pin_no, rw_pin_no, backlight_pin_no, data_pin_str
    );

    debug!("Initializing GPIO driver...");
    let gpio = GpiodDriver::open(&chip)?;
    debug!("{:?} initialized.", gpio);

    let mut e_pin = gpio.get_pin(e_pin_no)?;
    let e_out = e_pin.as_output()?;
    let mut rs_pin = gpio.get_pin(rs_pin_no)?;
    let rs_out = rs_pin.as_output()?;
    let mut rw_pin = rw_pin_no.map(|no| gpio.get_pin(no)).transpose()?;
    let rw_out = rw_pin.as_mut().map(|pin| pin.as_output()).transpose()?;
    let mut backlight_pin = backlight_pin_no.map(|no| gpio.get_pin(no)).transpose()?;
    let backlight_out = backlight_pin.as_mut().map(|pin| pin.as_output()).transpose()?;

    match config.display.bit_width {
        BitWidth::Four => {
            let mut data_bus = gpio.get_pin_bus(parse_pin_bus::<4>(&data_pin_str)?)?;
            let data_out = data_bus.as_output()?;
            let link = GpioHD44780Link::new_4bit(
                &*e_out,
                rw_out.as_deref(),
                &*rs_out,
                backlight_out.as_deref(),
                &*data_out,
                StdDelay,
            );
            let mut lcd = Display::new(link, config.display)?;
            demo(&mut lcd, config)
        }
        BitWidth::Eight => {
            let mut data_bus = gpio.get_pin_bus(parse_pin_bus::<8>(&data_pin_str)?)?;
            let data_out = data_bus.as_output()?;
            let link = GpioHD44780Link::new_8bit(
                &*e_out,
                rw_out.as_deref(),
                &*rs_out,
                backlight_out.as_deref(),
                &*data_out,
                StdDelay,
            );
            let mut lcd = Display::new(link, config.display)?;
            demo(&mut lcd, config)
        }
    }
}

fn demo<L: HD44780Link>(lcd: &mut Display<L>, config: &Config) -> eyre::Result<()> {
    info!(
        "{}x{} display ready, {} characters.",
        lcd.geometry().columns(),
        lcd.geometry().rows(),
        lcd.capacity()
    );

    let last = lcd.capacity() - 1;
    lcd.write_char('A', Some(0))?;
    lcd.write_char('B', Some(3))?;
    if lcd.geometry().rows() > 1 {
        // First character of the second row
        lcd.write_char('s', Some(lcd.geometry().columns() as usize))?;
    }
    lcd.write_char('?', Some(last))?;

    let greeting = &config.greeting;
    if !greeting.is_empty() {
        let start = 5;
        let room = (lcd.geometry().columns() as usize).saturating_sub(start);
        let shown: String = greeting.chars().take(room).collect();
        lcd.write_text(&shown, Some(start))?;
    }

    info!("{:?}", lcd.text());

    thread::sleep(Duration::from_secs(2));
    lcd.set_cursor_blinking_enabled(false)?;
    thread::sleep(Duration::from_secs(2));
    lcd.set_cursor_enabled(false)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_bus_separators() {
        assert_eq!(parse_pin_bus::<4>("26, 16,20;21").unwrap(), [26, 16, 20, 21]);
        assert!(parse_pin_bus::<4>("1 2 3").is_err());
        assert!(parse_pin_bus::<8>("1 2 3 4").is_err());
    }

    #[test]
    fn numbers_in_hex_or_decimal() {
        assert_eq!(parse_number("0x27").unwrap(), 0x27);
        assert_eq!(parse_number(" 63 ").unwrap(), 63);
        assert!(parse_number("0x100").is_err());
    }
}

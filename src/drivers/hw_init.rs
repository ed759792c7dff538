//! One-shot hardware peripheral initialization.
//!
//! Configures the LEDC timer/channels for the heater gates, the I2C bus
//! for the temperature sensors and the panel GPIO inputs using raw
//! ESP-IDF sys calls. Called once from `main()` before the control
//! tasks start.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

/// LEDC duty range: 13-bit resolution at 1 kHz.
pub const LEDC_MAX_DUTY: u16 = 8191;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    LedcInitFailed(i32),
    I2cInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::I2cInitFailed(rc) => write!(f, "I2C master init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

// ── Bring-up ──────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: called once from main() before the tasks spawn.
    unsafe {
        init_ledc()?;
        init_i2c()?;
        init_gpio_inputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── LEDC (heater PWM) ─────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    let timer_cfg = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_13_BIT,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        freq_hz: 1000,
        clk_cfg: ledc_clk_cfg_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let rc = unsafe { ledc_timer_config(&timer_cfg) };
    if rc != ESP_OK {
        return Err(HwInitError::LedcInitFailed(rc));
    }

    for (ch, gpio) in pins::HEATER_GPIOS.iter().enumerate() {
        let ch_cfg = ledc_channel_config_t {
            gpio_num: *gpio,
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: ch as ledc_channel_t,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        let rc = unsafe { ledc_channel_config(&ch_cfg) };
        if rc != ESP_OK {
            return Err(HwInitError::LedcInitFailed(rc));
        }
    }
    Ok(())
}

/// Apply a raw LEDC duty (0..=[`LEDC_MAX_DUTY`]) to a heater channel.
#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: usize, duty: u16) {
    // SAFETY: channels were configured in init_ledc.
    unsafe {
        let ch = channel as ledc_channel_t;
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, ch, u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, ch);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: usize, _duty: u16) {}

// ── I2C (temperature sensors) ─────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_i2c() -> Result<(), HwInitError> {
    let mut cfg: i2c_config_t = unsafe { core::mem::zeroed() };
    cfg.mode = i2c_mode_t_I2C_MODE_MASTER;
    cfg.sda_io_num = pins::I2C_SDA_GPIO;
    cfg.scl_io_num = pins::I2C_SCL_GPIO;
    cfg.sda_pullup_en = true;
    cfg.scl_pullup_en = true;
    // SAFETY: master mode selects the master member of the config union.
    unsafe {
        cfg.__bindgen_anon_1.master.clk_speed = 100_000;
    }

    let rc = unsafe { i2c_param_config(0, &cfg) };
    if rc != ESP_OK {
        return Err(HwInitError::I2cInitFailed(rc));
    }
    let rc = unsafe { i2c_driver_install(0, i2c_mode_t_I2C_MODE_MASTER, 0, 0, 0) };
    if rc != ESP_OK {
        return Err(HwInitError::I2cInitFailed(rc));
    }
    Ok(())
}

/// Read the 16-bit conversion register of one ADT7410.
#[cfg(target_os = "espidf")]
pub fn i2c_read_temp(channel: usize) -> Result<i16, i32> {
    let addr = pins::TEMP_SENSOR_ADDR_BASE + channel as u8;
    let reg = [0u8; 1];
    let mut buf = [0u8; 2];
    // SAFETY: bus was installed in init_i2c; 4 ticks (40 ms at the
    // default tick rate) covers a conversion readout.
    let rc = unsafe {
        i2c_master_write_read_device(
            0,
            addr,
            reg.as_ptr(),
            reg.len(),
            buf.as_mut_ptr(),
            buf.len(),
            4,
        )
    };
    if rc != ESP_OK {
        return Err(rc);
    }
    Ok(i16::from_be_bytes(buf))
}

// ── GPIO inputs (button, fuse sense) ──────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    let mut mask = 1u64 << pins::BUTTON_GPIO;
    for gpio in pins::FUSE_SENSE_GPIOS {
        mask |= 1u64 << gpio;
    }
    let cfg = gpio_config_t {
        pin_bit_mask: mask,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let rc = unsafe { gpio_config(&cfg) };
    if rc != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(rc));
    }
    Ok(())
}

/// Read a GPIO level. `true` = high.
#[cfg(target_os = "espidf")]
pub fn gpio_read(gpio: i32) -> bool {
    // SAFETY: pin was configured as input in init_gpio_inputs.
    unsafe { gpio_get_level(gpio) != 0 }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_gpio: i32) -> bool {
    true
}

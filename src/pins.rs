//! GPIO assignments for the WaxSteril control board (rev C).

/// Heater SSR gate drives (LEDC PWM).
pub const HEATER_GPIOS: [i32; 3] = [4, 5, 6];

/// I2C bus shared by the three ADT7410 sensors.
pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// ADT7410 base address; channel n responds at base + n.
pub const TEMP_SENSOR_ADDR_BASE: u8 = 0x48;

/// Front-panel run button (active low, internal pull-up).
pub const BUTTON_GPIO: i32 = 0;

/// Heater fuse sense inputs (high = fuse blown).
pub const FUSE_SENSE_GPIOS: [i32; 3] = [10, 11, 12];

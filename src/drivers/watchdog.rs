//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the appliance if the main loop
//! stalls. The main loop must call `feed()` on every iteration; the
//! control tasks are supervised indirectly through the diagnostics the
//! main loop collects from them.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

const TIMEOUT_MS: u32 = 8_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    /// Initialise and subscribe the current task to the TWDT.
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: TIMEOUT_MS,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let rc = esp_task_wdt_reconfigure(&cfg);
                if rc != ESP_OK {
                    log::warn!("TWDT reconfigure returned {} (may already be configured)", rc);
                }

                let rc = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = rc == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({}s timeout)", TIMEOUT_MS / 1000);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", rc);
                }
                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): no-op");
            Self {}
        }
    }

    /// Pet the watchdog. Call once per main-loop iteration.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: the current task subscribed in new().
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}

//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements              | Connects to                 |
//! |---------------|-------------------------|-----------------------------|
//! | `accessory`   | CharacteristicNotifier  | Accessory-protocol server   |
//! | `delay`       | DelayNs                 | FreeRTOS tick delay         |
//! | `gpio`        | GpioPort                | ESP32 GPIO                  |
//! | `log_sink`    | EventSink               | Serial log output           |
//! | `maintenance` | MaintenancePort         | WiFi driver, NVS, SoC reset |
//! | `spawner`     | TaskSpawner             | Core-pinned pthreads        |

pub mod accessory;
pub mod delay;
pub mod gpio;
pub mod log_sink;
pub mod maintenance;
pub mod spawner;

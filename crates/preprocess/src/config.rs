/// Model input size `(width, height)` of the default detector family.
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (640, 640);

/// Padding value on every channel; the network was trained with this fill.
pub const LETTERBOX_COLOR: u8 = 114;

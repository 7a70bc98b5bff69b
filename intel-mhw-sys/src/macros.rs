/// Declares a command layout as an array of DWords with named fields.
///
/// ```ignore
/// hw_command! {
///     /// MI_NOOP
///     pub struct MiNoop: 1 {
///         default { 0 => 0 }
///         identification_number, set_identification_number: 0, 0..=21;
///     }
/// }
/// ```
///
/// Field positions are `dword, lo..=hi` with inclusive bit bounds. The `default`
/// block holds whole-DWord values applied on top of an all-zero command.
macro_rules! hw_command {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $dws:literal {
            default { $($ddw:literal => $dval:expr),* $(,)? }
            $(
                $(#[$fmeta:meta])*
                $get:ident, $set:ident: $fdw:literal, $lo:literal..=$hi:literal;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(C)]
        pub struct $name {
            pub dw: [u32; $dws],
        }

        impl $name {
            pub const DW_SIZE: usize = $dws;
            pub const BYTE_SIZE: usize = $dws * 4;
            /// Value of the DWordLength header field (length excluding the first two DWords).
            pub const DWORD_LENGTH: u32 = ($dws as u32).saturating_sub(2);

            $(
                $(#[$fmeta])*
                #[inline]
                pub fn $get(&self) -> u32 {
                    $crate::bits::get(self.dw[$fdw], $lo, $hi)
                }

                #[inline]
                pub fn $set(&mut self, value: u32) {
                    $crate::bits::set(&mut self.dw[$fdw], $lo, $hi, value)
                }
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                #[allow(unused_mut)]
                let mut dw = [0u32; $dws];
                $(dw[$ddw] = $dval;)*
                Self { dw }
            }
        }

        impl $crate::HwCommand for $name {
            const BYTE_SIZE: usize = $dws * 4;
            const NAME: &'static str = stringify!($name);

            fn as_dwords(&self) -> &[u32] {
                &self.dw
            }

            fn as_dwords_mut(&mut self) -> &mut [u32] {
                &mut self.dw
            }
        }
    };
}

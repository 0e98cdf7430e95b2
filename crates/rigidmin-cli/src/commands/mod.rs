pub mod quench;

pub mod school_modules;

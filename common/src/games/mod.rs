pub mod side_stacker;

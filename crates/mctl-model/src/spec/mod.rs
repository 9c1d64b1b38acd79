mod descriptor;
pub use descriptor::ProcessDescriptor;

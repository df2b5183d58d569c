use serde::{Deserialize, Serialize};
use tch::nn::{self, ModuleT};
use tch::vision;

/// Architectures available from the tch model zoo.
///
/// Weights are randomly initialized under the given var-store path; loading
/// pretrained weights is the caller's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelArch {
    Resnet18,
    Resnet34,
    Resnet50,
    Alexnet,
    Vgg16,
    Densenet121,
    MobilenetV2,
    SqueezenetV1_1,
}

impl ModelArch {
    /// The zoo constructors return assorted module types, so every arm is
    /// wrapped into a uniform `FuncT`.
    pub fn build(&self, p: &nn::Path, num_classes: i64) -> nn::FuncT<'static> {
        match self {
            ModelArch::Resnet18 => wrap(vision::resnet::resnet18(p, num_classes)),
            ModelArch::Resnet34 => wrap(vision::resnet::resnet34(p, num_classes)),
            ModelArch::Resnet50 => wrap(vision::resnet::resnet50(p, num_classes)),
            ModelArch::Alexnet => wrap(vision::alexnet::alexnet(p, num_classes)),
            ModelArch::Vgg16 => wrap(vision::vgg::vgg16(p, num_classes)),
            ModelArch::Densenet121 => wrap(vision::densenet::densenet121(p, num_classes)),
            ModelArch::MobilenetV2 => wrap(vision::mobilenet::v2(p, num_classes)),
            ModelArch::SqueezenetV1_1 => wrap(vision::squeezenet::v1_1(p, num_classes)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelArch::Resnet18 => "resnet18",
            ModelArch::Resnet34 => "resnet34",
            ModelArch::Resnet50 => "resnet50",
            ModelArch::Alexnet => "alexnet",
            ModelArch::Vgg16 => "vgg16",
            ModelArch::Densenet121 => "densenet121",
            ModelArch::MobilenetV2 => "mobilenet_v2",
            ModelArch::SqueezenetV1_1 => "squeezenet1_1",
        }
    }
}

impl std::fmt::Display for ModelArch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn wrap<M: nn::ModuleT + 'static>(model: M) -> nn::FuncT<'static> {
    nn::func_t(move |xs, train| model.forward_t(xs, train))
}
